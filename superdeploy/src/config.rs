//! Deployment configuration.
//!
//! A [`DeploymentConfig`] is built once through [`DeploymentConfigBuilder`]
//! with every default applied up front, validated, and then only read.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default deployment environment.
pub const DEFAULT_ENVIRONMENT: &str = "prod";

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default container image tag.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Default settling delay of the health check, in seconds.
pub const DEFAULT_HEALTH_SETTLE_SECS: u64 = 2;

/// Account placeholder used in registry URLs until the account is known.
pub const ACCOUNT_PLACEHOLDER: &str = "your-account";

/// Immutable, fully-populated deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Project name; prefixes every derived resource name.
    pub project_name: String,
    /// Deployment environment (dev, staging, prod).
    pub environment: String,
    /// AWS region.
    pub aws_region: String,
    /// Container image tag.
    pub image_tag: String,
    /// Preview only: infrastructure plan, no push/deploy/health.
    pub plan_only: bool,
    /// Run only the infrastructure half of the workflow.
    pub infrastructure_only: bool,
    /// Run only the application half of the workflow.
    pub application_only: bool,
    /// Accepted for compatibility; infrastructure apply never prompts.
    pub auto_approve: bool,
    /// Verbose output.
    pub verbose: bool,
    /// Working directory of every collaborator.
    pub project_dir: PathBuf,
    /// Registry account; resolved from the credential check when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_account_id: Option<String>,
    /// Settling delay of the health check, in seconds.
    pub health_settle_secs: u64,
}

impl DeploymentConfig {
    /// Starts a builder for the given project.
    #[must_use]
    pub fn builder(project_name: impl Into<String>) -> DeploymentConfigBuilder {
        DeploymentConfigBuilder::new(project_name)
    }

    /// Checks the invariants of the flag set.
    ///
    /// # Errors
    ///
    /// Returns an error if the project name is blank or both
    /// `infrastructure_only` and `application_only` are set.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.project_name.trim().is_empty() {
            return Err(ConfigurationError::new("Project name cannot be empty")
                .with_flags(["--project-name"]));
        }
        if self.infrastructure_only && self.application_only {
            return Err(ConfigurationError::exclusive_modes());
        }
        Ok(())
    }

    /// Returns true if the infrastructure half (setup, tests, infra) runs.
    #[must_use]
    pub fn runs_infrastructure(&self) -> bool {
        !self.application_only
    }

    /// Returns true if the application half (build onwards) runs.
    #[must_use]
    pub fn runs_application(&self) -> bool {
        !self.infrastructure_only
    }

    /// Returns true if mutating application stages run.
    #[must_use]
    pub fn runs_release(&self) -> bool {
        self.runs_application() && !self.plan_only
    }

    /// The working directory of collaborators.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// The infrastructure-as-code directory.
    #[must_use]
    pub fn terraform_dir(&self) -> PathBuf {
        self.project_dir.join("terraform")
    }

    /// The local image reference, `project:tag`.
    #[must_use]
    pub fn local_image(&self) -> String {
        format!("{}:{}", self.project_name, self.image_tag)
    }

    /// The registry host for the given account.
    #[must_use]
    pub fn registry_host(&self, account: Option<&str>) -> String {
        let account = account
            .or(self.aws_account_id.as_deref())
            .unwrap_or(ACCOUNT_PLACEHOLDER);
        format!("{account}.dkr.ecr.{}.amazonaws.com", self.aws_region)
    }

    /// The registry repository for the given account.
    #[must_use]
    pub fn registry_repository(&self, account: Option<&str>) -> String {
        format!(
            "{}/{}-{}",
            self.registry_host(account),
            self.project_name,
            self.environment
        )
    }

    /// The remote image reference for the given account.
    #[must_use]
    pub fn remote_image(&self, account: Option<&str>) -> String {
        format!("{}:{}", self.registry_repository(account), self.image_tag)
    }

    /// The cluster running the service.
    #[must_use]
    pub fn cluster_name(&self) -> String {
        format!("{}-cluster-{}", self.project_name, self.environment)
    }

    /// The service to update.
    #[must_use]
    pub fn service_name(&self) -> String {
        format!("{}-service-{}", self.project_name, self.environment)
    }
}

/// Builder applying explicit defaults to every optional field.
#[derive(Debug, Clone)]
pub struct DeploymentConfigBuilder {
    config: DeploymentConfig,
}

impl DeploymentConfigBuilder {
    /// Creates a builder with all defaults.
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            config: DeploymentConfig {
                project_name: project_name.into(),
                environment: DEFAULT_ENVIRONMENT.to_string(),
                aws_region: DEFAULT_REGION.to_string(),
                image_tag: DEFAULT_IMAGE_TAG.to_string(),
                plan_only: false,
                infrastructure_only: false,
                application_only: false,
                auto_approve: false,
                verbose: false,
                project_dir: PathBuf::from("."),
                aws_account_id: None,
                health_settle_secs: DEFAULT_HEALTH_SETTLE_SECS,
            },
        }
    }

    /// Sets the environment.
    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = environment.into();
        self
    }

    /// Sets the AWS region.
    #[must_use]
    pub fn aws_region(mut self, region: impl Into<String>) -> Self {
        self.config.aws_region = region.into();
        self
    }

    /// Sets the image tag.
    #[must_use]
    pub fn image_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.image_tag = tag.into();
        self
    }

    /// Sets plan-only mode.
    #[must_use]
    pub fn plan_only(mut self, value: bool) -> Self {
        self.config.plan_only = value;
        self
    }

    /// Sets infrastructure-only mode.
    #[must_use]
    pub fn infrastructure_only(mut self, value: bool) -> Self {
        self.config.infrastructure_only = value;
        self
    }

    /// Sets application-only mode.
    #[must_use]
    pub fn application_only(mut self, value: bool) -> Self {
        self.config.application_only = value;
        self
    }

    /// Sets the auto-approve flag.
    #[must_use]
    pub fn auto_approve(mut self, value: bool) -> Self {
        self.config.auto_approve = value;
        self
    }

    /// Sets verbose output.
    #[must_use]
    pub fn verbose(mut self, value: bool) -> Self {
        self.config.verbose = value;
        self
    }

    /// Sets the project directory.
    #[must_use]
    pub fn project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.project_dir = dir.into();
        self
    }

    /// Pins the registry account.
    #[must_use]
    pub fn aws_account_id(mut self, account: Option<String>) -> Self {
        self.config.aws_account_id = account.filter(|a| !a.trim().is_empty());
        self
    }

    /// Sets the health check settling delay.
    #[must_use]
    pub fn health_settle_secs(mut self, secs: u64) -> Self {
        self.config.health_settle_secs = secs;
        self
    }

    /// Returns the configuration without validating it.
    ///
    /// The orchestrator validates again before running, so an invalid
    /// record built this way never reaches a collaborator.
    #[must_use]
    pub fn build_unchecked(self) -> DeploymentConfig {
        self.config
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// See [`DeploymentConfig::validate`].
    pub fn build(self) -> Result<DeploymentConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
