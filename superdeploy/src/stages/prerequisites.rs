//! Prerequisite check: tools, credentials, container engine, manifest.

use super::Stage;
use crate::context::{RunContext, FACT_AWS_ACCOUNT_ID};
use crate::core::{StageId, StageOutput};
use crate::errors::{DeployError, PrerequisiteError};
use crate::exec::CommandSpec;
use crate::templates::{self, Asset};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Tools every run needs on PATH.
pub const REQUIRED_TOOLS: [&str; 4] = ["docker", "aws", "python3", "pip"];

/// Tool needed only when the infrastructure stage runs.
pub const INFRASTRUCTURE_TOOL: &str = "terraform";

/// Verifies the environment before anything is changed.
///
/// Missing tools are reported together. When the account id is not
/// pinned in the configuration, the one returned by the credential check
/// is handed on as a fact.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrerequisitesStage;

impl PrerequisitesStage {
    fn required_tools(ctx: &RunContext) -> Vec<&'static str> {
        let mut tools = REQUIRED_TOOLS.to_vec();
        if ctx.config().runs_infrastructure() {
            tools.push(INFRASTRUCTURE_TOOL);
        }
        tools
    }
}

#[async_trait]
impl Stage for PrerequisitesStage {
    fn id(&self) -> StageId {
        StageId::Prerequisites
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        info!("Checking prerequisites...");

        let missing: Vec<String> = Self::required_tools(ctx)
            .into_iter()
            .filter(|tool| match ctx.runner().locate(tool) {
                Some(path) => {
                    debug!(tool, path = %path.display(), "Found tool");
                    false
                }
                None => true,
            })
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(PrerequisiteError::MissingTools { tools: missing }.into());
        }

        let identity = ctx
            .run(
                CommandSpec::new("aws")
                    .args(["sts", "get-caller-identity", "--query", "Account", "--output", "text"])
                    .current_dir(ctx.project_dir())
                    .captured(),
            )
            .await?;
        if !identity.is_success() {
            return Err(PrerequisiteError::InvalidCredentials.into());
        }

        let engine = ctx
            .run(
                CommandSpec::new("docker")
                    .arg("info")
                    .current_dir(ctx.project_dir())
                    .captured(),
            )
            .await?;
        if !engine.is_success() {
            return Err(PrerequisiteError::EngineNotRunning.into());
        }

        let values = templates::substitutions(ctx.config());
        if templates::materialize(Asset::Requirements, ctx.project_dir(), &values)? {
            warn!("requirements.txt not found, created a basic one");
        }

        info!(outcome = "success", "All prerequisites satisfied");

        let account = identity.stdout.trim();
        if account.is_empty() {
            Ok(StageOutput::ok_empty())
        } else {
            Ok(StageOutput::ok_value(
                FACT_AWS_ACCOUNT_ID,
                serde_json::json!(account),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::exec::CommandOutput;
    use crate::testing::fixtures::{run_context, TestProject};
    use crate::testing::ScriptedCommandRunner;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_all_satisfied_records_account() {
        let project = TestProject::complete();
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.on(
            &["aws", "sts", "get-caller-identity"],
            CommandOutput::with_stdout("123456789012\n"),
        );
        let ctx = run_context(project.config("demo").build().unwrap(), runner.clone());

        let output = PrerequisitesStage.execute(&ctx).await.unwrap();

        assert!(output.is_success());
        assert_eq!(output.get_str(FACT_AWS_ACCOUNT_ID), Some("123456789012"));
        assert_eq!(
            runner.lookups(),
            vec!["docker", "aws", "python3", "pip", "terraform"]
        );
        assert_eq!(
            runner.command_lines(),
            vec![
                "aws sts get-caller-identity --query Account --output text",
                "docker info",
            ]
        );
    }

    #[tokio::test]
    async fn test_application_only_skips_terraform_lookup() {
        let project = TestProject::complete();
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.without_tool("terraform");
        let config = project.config("demo").application_only(true).build().unwrap();
        let ctx = run_context(config, runner.clone());

        let output = PrerequisitesStage.execute(&ctx).await.unwrap();

        assert!(output.is_success());
        assert!(!runner.lookups().contains(&"terraform".to_string()));
    }

    #[tokio::test]
    async fn test_missing_tools_reported_together() {
        let project = TestProject::complete();
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.without_tool("docker");
        runner.without_tool("pip");
        let ctx = run_context(project.config("demo").build().unwrap(), runner.clone());

        let err = PrerequisitesStage.execute(&ctx).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Prerequisite);
        assert_eq!(err.to_string(), "Missing required tools: docker, pip");
        assert!(runner.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let project = TestProject::complete();
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.fail_on(&["aws", "sts"], 255);
        let ctx = run_context(project.config("demo").build().unwrap(), runner.clone());

        let err = PrerequisitesStage.execute(&ctx).await.unwrap_err();

        assert_eq!(err.to_string(), "AWS credentials not configured");
        assert!(!runner.was_invoked(&["docker"]));
    }

    #[tokio::test]
    async fn test_engine_not_running() {
        let project = TestProject::complete();
        let runner = Arc::new(ScriptedCommandRunner::new());
        runner.fail_on(&["docker", "info"], 1);
        let ctx = run_context(project.config("demo").build().unwrap(), runner);

        let err = PrerequisitesStage.execute(&ctx).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Prerequisite);
        assert_eq!(err.to_string(), "Docker is not running");
    }

    #[tokio::test]
    async fn test_missing_manifest_is_created() {
        let project = TestProject::new();
        let runner = Arc::new(ScriptedCommandRunner::new());
        let ctx = run_context(project.config("demo").build().unwrap(), runner);

        let output = PrerequisitesStage.execute(&ctx).await.unwrap();

        assert!(output.is_success());
        assert!(output.data.is_empty());
        assert!(project.read("requirements.txt").contains("flask"));
    }
}
