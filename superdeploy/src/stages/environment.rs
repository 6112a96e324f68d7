//! Python environment setup.

use super::Stage;
use crate::context::RunContext;
use crate::core::{StageId, StageOutput};
use crate::errors::DeployError;
use crate::exec::CommandSpec;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Virtual environment directory, relative to the project.
pub const VENV_DIR: &str = "venv";

/// Path of a binary inside the project's virtual environment.
pub(crate) fn venv_bin(tool: &str) -> String {
    Path::new(VENV_DIR)
        .join("bin")
        .join(tool)
        .to_string_lossy()
        .into_owned()
}

/// Creates the virtual environment if needed and installs dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentSetupStage;

#[async_trait]
impl Stage for EnvironmentSetupStage {
    fn id(&self) -> StageId {
        StageId::EnvironmentSetup
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        let dir = ctx.project_dir();

        if dir.join(VENV_DIR).exists() {
            info!("Using existing virtual environment");
        } else {
            info!("Creating virtual environment...");
            ctx.run_checked(
                "Virtual environment creation",
                CommandSpec::new("python3")
                    .args(["-m", "venv", VENV_DIR])
                    .current_dir(dir),
            )
            .await?;
        }

        let pip = venv_bin("pip");

        info!("Upgrading pip...");
        ctx.run_checked(
            "Pip upgrade",
            CommandSpec::new(&pip)
                .args(["install", "--upgrade", "pip"])
                .current_dir(dir),
        )
        .await?;

        info!("Installing requirements...");
        ctx.run_checked(
            "Requirements installation",
            CommandSpec::new(&pip)
                .args(["install", "-r", "requirements.txt"])
                .current_dir(dir),
        )
        .await?;

        info!(outcome = "success", "Python environment ready");
        Ok(StageOutput::ok_empty())
    }
}
