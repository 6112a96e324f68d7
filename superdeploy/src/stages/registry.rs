//! Registry login, tag and push.

use super::Stage;
use crate::context::RunContext;
use crate::core::{StageId, StageOutput};
use crate::errors::DeployError;
use crate::exec::CommandSpec;
use async_trait::async_trait;
use tracing::{info, warn};

/// Pushes the local image to the project's ECR repository.
///
/// The registry password is read from the cloud CLI and piped to
/// `docker login`; it is never passed as an argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryPushStage;

#[async_trait]
impl Stage for RegistryPushStage {
    fn id(&self) -> StageId {
        StageId::RegistryPush
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        let config = ctx.config();
        let dir = ctx.project_dir();
        let account = ctx.aws_account_id();
        if account.is_none() {
            warn!("AWS account id unknown - registry URL uses a placeholder");
        }

        info!("Authenticating with ECR...");
        let password = ctx
            .run_checked(
                "ECR authentication",
                CommandSpec::new("aws")
                    .args(["ecr", "get-login-password", "--region", config.aws_region.as_str()])
                    .current_dir(dir)
                    .captured(),
            )
            .await?;

        let host = config.registry_host(account);
        ctx.run_checked(
            "Docker login",
            CommandSpec::new("docker")
                .args(["login", "--username", "AWS", "--password-stdin", host.as_str()])
                .current_dir(dir)
                .captured()
                .with_stdin(password.stdout.trim()),
        )
        .await?;

        let local = config.local_image();
        let remote = config.remote_image(account);
        info!("Tagging image: {local} -> {remote}");
        ctx.run_checked(
            "Docker tag",
            CommandSpec::new("docker")
                .args(["tag", local.as_str(), remote.as_str()])
                .current_dir(dir),
        )
        .await?;

        info!("Pushing image to ECR...");
        ctx.run_checked(
            "Docker push",
            CommandSpec::new("docker")
                .args(["push", remote.as_str()])
                .current_dir(dir),
        )
        .await?;

        info!(outcome = "success", "Image pushed to ECR successfully");
        Ok(StageOutput::ok_value("remote_image", serde_json::json!(remote)))
    }
}
