//! Post-deployment health check.

use super::Stage;
use crate::context::RunContext;
use crate::core::{StageId, StageOutput};
use crate::errors::DeployError;
use crate::exec::CommandSpec;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Waits for the service to settle, then for it to report stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCheckStage;

#[async_trait]
impl Stage for HealthCheckStage {
    fn id(&self) -> StageId {
        StageId::HealthCheck
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        let config = ctx.config();

        info!("Checking application health...");
        if config.health_settle_secs > 0 {
            tokio::time::sleep(Duration::from_secs(config.health_settle_secs)).await;
        }

        let cluster = config.cluster_name();
        let service = config.service_name();
        ctx.run_checked(
            "Health check",
            CommandSpec::new("aws")
                .args([
                    "ecs",
                    "wait",
                    "services-stable",
                    "--cluster",
                    cluster.as_str(),
                    "--services",
                    service.as_str(),
                    "--region",
                    config.aws_region.as_str(),
                ])
                .current_dir(ctx.project_dir())
                .captured(),
        )
        .await?;

        info!(outcome = "success", "Application is healthy");
        Ok(StageOutput::ok_empty())
    }
}
