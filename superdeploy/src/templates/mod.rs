//! Default project assets.
//!
//! When a project lacks a dependency manifest, a container build file or
//! an infrastructure directory, the workflow writes one from the static
//! templates shipped in `assets/`. Placeholders use the `{{ key }}` form
//! and are filled from an explicit substitution map; a placeholder with no
//! entry in the map is an error rather than an empty string.

use crate::config::DeploymentConfig;
use crate::errors::{DeployError, TemplateError};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Python base image version of the default container build file.
pub const PYTHON_VERSION: &str = "3.11";

/// Port the default container listens on.
pub const APP_PORT: u16 = 8000;

/// Worker processes of the default container.
pub const WORKERS: u32 = 4;

/// Images kept by the default registry lifecycle policy.
pub const IMAGE_RETENTION: u32 = 10;

/// Substitution map handed to [`render`].
pub type Substitutions = BTreeMap<&'static str, String>;

/// A file the workflow can synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    /// `requirements.txt`
    Requirements,
    /// `Dockerfile`
    Dockerfile,
    /// `terraform/main.tf`
    TerraformMain,
    /// `terraform/variables.tf`
    TerraformVariables,
}

impl Asset {
    /// Path of the asset relative to the project directory.
    #[must_use]
    pub fn relative_path(self) -> &'static str {
        match self {
            Self::Requirements => "requirements.txt",
            Self::Dockerfile => "Dockerfile",
            Self::TerraformMain => "terraform/main.tf",
            Self::TerraformVariables => "terraform/variables.tf",
        }
    }

    /// Template name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Requirements => "requirements.txt.tmpl",
            Self::Dockerfile => "Dockerfile.tmpl",
            Self::TerraformMain => "main.tf.tmpl",
            Self::TerraformVariables => "variables.tf.tmpl",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Self::Requirements => include_str!("../../assets/requirements.txt.tmpl"),
            Self::Dockerfile => include_str!("../../assets/Dockerfile.tmpl"),
            Self::TerraformMain => include_str!("../../assets/main.tf.tmpl"),
            Self::TerraformVariables => include_str!("../../assets/variables.tf.tmpl"),
        }
    }
}

/// Builds the substitution map for a deployment.
#[must_use]
pub fn substitutions(config: &DeploymentConfig) -> Substitutions {
    BTreeMap::from([
        ("project_name", config.project_name.clone()),
        ("environment", config.environment.clone()),
        ("aws_region", config.aws_region.clone()),
        ("python_version", PYTHON_VERSION.to_string()),
        ("app_port", APP_PORT.to_string()),
        ("workers", WORKERS.to_string()),
        ("image_retention", IMAGE_RETENTION.to_string()),
    ])
}

/// Renders an asset with the given substitutions.
///
/// # Errors
///
/// Returns [`TemplateError::MissingKey`] for the first placeholder that
/// has no value in `values`.
pub fn render(asset: Asset, values: &Substitutions) -> Result<String, TemplateError> {
    let source = asset.source();

    if let Some(key) = PLACEHOLDER
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .find(|key| !values.contains_key(key.as_str()))
    {
        return Err(TemplateError::MissingKey {
            template: asset.name().to_string(),
            key,
        });
    }

    let rendered = PLACEHOLDER.replace_all(source, |caps: &Captures<'_>| {
        values.get(&caps[1]).cloned().unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

/// Writes an asset under `dir` unless a file is already there.
///
/// Returns `true` if the file was written.
///
/// # Errors
///
/// Returns an error if rendering fails or the file cannot be written.
pub fn materialize(asset: Asset, dir: &Path, values: &Substitutions) -> Result<bool, DeployError> {
    let path = dir.join(asset.relative_path());
    if path.exists() {
        debug!(path = %path.display(), "Keeping existing file");
        return Ok(false);
    }

    let content = render(asset, values)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    debug!(path = %path.display(), template = asset.name(), "Wrote default file");
    Ok(true)
}
