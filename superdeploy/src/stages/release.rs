//! Application deployment.

use super::Stage;
use crate::context::RunContext;
use crate::core::{StageId, StageOutput};
use crate::errors::DeployError;
use crate::exec::CommandSpec;
use async_trait::async_trait;
use tracing::info;

/// Forces a new deployment of the ECS service so it pulls the pushed tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationDeployStage;

#[async_trait]
impl Stage for ApplicationDeployStage {
    fn id(&self) -> StageId {
        StageId::ApplicationDeploy
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        let config = ctx.config();
        let cluster = config.cluster_name();
        let service = config.service_name();

        info!(cluster = %cluster, service = %service, "Updating ECS service...");
        info!("New image: {}", config.remote_image(ctx.aws_account_id()));
        ctx.run_checked(
            "ECS service update",
            CommandSpec::new("aws")
                .args([
                    "ecs",
                    "update-service",
                    "--cluster",
                    cluster.as_str(),
                    "--service",
                    service.as_str(),
                    "--force-new-deployment",
                    "--region",
                    config.aws_region.as_str(),
                ])
                .current_dir(ctx.project_dir())
                .captured(),
        )
        .await?;

        info!(outcome = "success", "Application deployment completed");
        Ok(StageOutput::ok_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::exec::{CommandOutput, MockCommandRunner};
    use crate::testing::fixtures::{run_context, TestProject};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_update_service() {
        let project = TestProject::complete();
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|spec| {
                spec.display()
                    == "aws ecs update-service --cluster demo-cluster-dev --service demo-service-dev --force-new-deployment --region us-east-1"
            })
            .times(1)
            .returning(|_| Ok(CommandOutput::with_stdout("{}")));

        let config = project.config("demo").environment("dev").build().unwrap();
        let ctx = run_context(config, Arc::new(runner));

        assert!(ApplicationDeployStage.execute(&ctx).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_update_failure() {
        let project = TestProject::complete();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_| {
            Ok(CommandOutput {
                status: 254,
                stdout: String::new(),
                stderr: "ServiceNotFoundException".to_string(),
            })
        });

        let ctx = run_context(project.config("demo").build().unwrap(), Arc::new(runner));
        let err = ApplicationDeployStage.execute(&ctx).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StageExecution);
        match err {
            DeployError::StageExecution(inner) => {
                assert_eq!(inner.stderr.as_deref(), Some("ServiceNotFoundException"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_update_failure_reason_reaches_report() {
        use crate::pipeline::{Orchestrator, RunOutcome};
        use crate::testing::ScriptedCommandRunner;

        let project = TestProject::complete();
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.on(
            &["aws", "ecs", "update-service"],
            CommandOutput {
                status: 254,
                stdout: String::new(),
                stderr: "An error occurred (ServiceNotFoundException)\n".to_string(),
            },
        );

        let report = Orchestrator::new(runner)
            .run(project.config("demo").build().unwrap())
            .await;

        assert_eq!(report.outcome, RunOutcome::Failed);
        assert_eq!(
            report.error.as_deref(),
            Some("ECS service update failed (exit status 254): An error occurred (ServiceNotFoundException)")
        );
    }
}
