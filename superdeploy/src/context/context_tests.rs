//! Tests for the run context.

#[cfg(test)]
mod tests {
    use crate::config::DeploymentConfig;
    use crate::context::{RunContext, FACT_AWS_ACCOUNT_ID};
    use crate::core::StageId;
    use crate::errors::{DeployError, ErrorKind};
    use crate::exec::{CommandOutput, CommandSpec};
    use crate::testing::{CollectingEventSink, ScriptedCommandRunner};
    use std::sync::Arc;

    fn context_with(
        config: DeploymentConfig,
    ) -> (RunContext, Arc<ScriptedCommandRunner>, Arc<CollectingEventSink>) {
        let runner = Arc::new(ScriptedCommandRunner::new());
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = RunContext::new(Arc::new(config), runner.clone(), sink.clone());
        (ctx, runner, sink)
    }

    #[test]
    fn test_step_timer() {
        let (mut ctx, _, _) = context_with(DeploymentConfig::builder("demo").build().unwrap());

        assert!(ctx.end_step().is_none());
        ctx.begin_step(StageId::Tests);
        assert!(ctx.end_step().is_some());
        assert!(ctx.end_step().is_none());

        ctx.begin_step(StageId::ImageBuild);
        assert!(ctx.abandon_step().is_some());
        assert!(ctx.end_step().is_none());
    }

    #[test]
    fn test_account_resolution_prefers_config() {
        let config = DeploymentConfig::builder("demo")
            .aws_account_id(Some("111".to_string()))
            .build()
            .unwrap();
        let (mut ctx, _, _) = context_with(config);
        ctx.record_facts([(FACT_AWS_ACCOUNT_ID.to_string(), serde_json::json!("222"))]);
        assert_eq!(ctx.aws_account_id(), Some("111"));

        let (mut ctx, _, _) = context_with(DeploymentConfig::builder("demo").build().unwrap());
        assert_eq!(ctx.aws_account_id(), None);
        ctx.record_facts([(FACT_AWS_ACCOUNT_ID.to_string(), serde_json::json!("222"))]);
        assert_eq!(ctx.aws_account_id(), Some("222"));
    }

    #[tokio::test]
    async fn test_run_checked_maps_non_zero_status() {
        let (ctx, runner, _) = context_with(DeploymentConfig::builder("demo").build().unwrap());
        runner.on(
            &["docker", "build"],
            CommandOutput {
                status: 2,
                stdout: String::new(),
                stderr: "no such file\n".to_string(),
            },
        );

        let err = ctx
            .run_checked("Docker build", CommandSpec::new("docker").arg("build"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StageExecution);
        match err {
            DeployError::StageExecution(inner) => {
                assert_eq!(inner.status, 2);
                assert_eq!(inner.stderr.as_deref(), Some("no such file"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let ok = ctx
            .run_checked("Docker info", CommandSpec::new("docker").arg("info"))
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_launch_failure_is_unexpected() {
        let (ctx, runner, _) = context_with(DeploymentConfig::builder("demo").build().unwrap());
        runner.error_on(&["terraform"]);

        let err = ctx.run(CommandSpec::new("terraform")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_events_are_enriched() {
        let config = DeploymentConfig::builder("demo").environment("dev").build().unwrap();
        let (ctx, _, sink) = context_with(config);

        ctx.try_emit_event("stage.started", Some(serde_json::json!({"stage": "tests"})));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        let data = events[0].1.as_ref().unwrap();
        assert_eq!(data["stage"], "tests");
        assert_eq!(data["project"], "demo");
        assert_eq!(data["environment"], "dev");
        assert_eq!(data["run_id"], ctx.identity().run_id.to_string());
    }
}
