//! Infrastructure provisioning with Terraform.

use super::Stage;
use crate::context::RunContext;
use crate::core::{StageId, StageOutput};
use crate::errors::DeployError;
use crate::exec::CommandSpec;
use crate::templates::{self, Asset};
use async_trait::async_trait;
use tracing::{info, warn};

/// Initializes Terraform, then plans or applies.
///
/// Writes a default configuration when the project has no `terraform/`
/// directory. An existing directory is used as it is. Apply never prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfrastructureStage;

#[async_trait]
impl Stage for InfrastructureStage {
    fn id(&self) -> StageId {
        StageId::Infrastructure
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        let config = ctx.config();
        let dir = config.terraform_dir();

        if !dir.exists() {
            warn!("No terraform configuration found - creating a default one");
            let values = templates::substitutions(config);
            for asset in [Asset::TerraformMain, Asset::TerraformVariables] {
                templates::materialize(asset, ctx.project_dir(), &values)?;
            }
        }

        info!("Initializing Terraform...");
        ctx.run_checked(
            "Terraform init",
            CommandSpec::new("terraform")
                .args(["init", "-input=false"])
                .current_dir(&dir),
        )
        .await?;

        let (action, command) = if config.plan_only {
            info!("Running Terraform plan...");
            ("Terraform plan", CommandSpec::new("terraform").args(["plan", "-input=false"]))
        } else {
            info!("Applying Terraform configuration...");
            (
                "Terraform apply",
                CommandSpec::new("terraform").args(["apply", "-auto-approve", "-input=false"]),
            )
        };
        ctx.run_checked(action, command.current_dir(&dir)).await?;

        info!(outcome = "success", "Infrastructure deployment completed");
        Ok(StageOutput::ok_value(
            "terraform_action",
            serde_json::json!(if config.plan_only { "plan" } else { "apply" }),
        ))
    }
}
