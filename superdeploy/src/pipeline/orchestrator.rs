//! The deployment workflow orchestrator.

use super::cancellation::CancellationToken;
use super::report::{RunOutcome, RunReport};
use super::spec::{default_stages, StageSpec};
use crate::config::DeploymentConfig;
use crate::context::{RunContext, RunIdentity};
use crate::core::{StageId, StageOutput, StageStatus};
use crate::errors::{ConfigurationError, DeployError, ErrorKind};
use crate::events::{EventSink, NoOpEventSink};
use crate::exec::CommandRunner;
use crate::summary::{RunSummary, StageRecord};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Reason recorded when the token carries none.
const DEFAULT_INTERRUPT_REASON: &str = "interrupted by user";

/// Runs the deployment stages in their fixed order.
///
/// Each run validates the flags, selects the member stages, and executes
/// them one at a time. The first failure ends the run; later stages and
/// the summary are never reached. A cancelled token abandons the running
/// stage, which drops (and so kills) any child process it owns.
pub struct Orchestrator {
    runner: Arc<dyn CommandRunner>,
    event_sink: Arc<dyn EventSink>,
    cancellation: Arc<CancellationToken>,
    stages: Vec<StageSpec>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("stages", &self.stages.iter().map(|s| s.id).collect::<Vec<_>>())
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with the default stage table.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            event_sink: Arc::new(NoOpEventSink),
            cancellation: CancellationToken::new(),
            stages: default_stages(),
        }
    }

    /// Sets the sink receiving lifecycle events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Sets the token that interrupts the run.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// Replaces the stage with the same id.
    ///
    /// A spec without a predicate keeps the gating of the stage it replaces.
    #[must_use]
    pub fn with_stage(mut self, mut spec: StageSpec) -> Self {
        if let Some(slot) = self.stages.iter_mut().find(|s| s.id == spec.id) {
            if spec.predicate.is_none() {
                spec.predicate = slot.predicate;
            }
            *slot = spec;
        } else {
            self.stages.push(spec);
            self.stages.sort_by_key(|s| s.id);
        }
        self
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> Arc<CancellationToken> {
        self.cancellation.clone()
    }

    /// Stages that run under `config`, in execution order.
    #[must_use]
    pub fn plan(&self, config: &DeploymentConfig) -> Vec<StageId> {
        self.stages
            .iter()
            .filter(|spec| spec.should_run(config))
            .map(|spec| spec.id)
            .collect()
    }

    /// Runs the workflow.
    ///
    /// Never panics and never returns an error: every failure is folded
    /// into the report's outcome.
    pub async fn run(&self, config: DeploymentConfig) -> RunReport {
        let started = Instant::now();

        if let Err(err) = config.validate() {
            return self.reject(config, &err, started);
        }

        let config = Arc::new(config);
        let selected: Vec<&StageSpec> = self
            .stages
            .iter()
            .filter(|spec| spec.should_run(&config))
            .collect();
        let plan: Vec<StageId> = selected.iter().map(|spec| spec.id).collect();

        let mut ctx = RunContext::new(config, self.runner.clone(), self.event_sink.clone());
        info!(
            run_id = %ctx.identity().run_id,
            environment = %ctx.config().environment,
            "Python Deployment: {}",
            ctx.config().project_name
        );
        let left_out: Vec<StageId> = StageId::ALL
            .into_iter()
            .filter(|id| id.is_mutating() && !plan.contains(id))
            .collect();
        if !left_out.is_empty() {
            debug!(stages = ?left_out, "Release stages not part of this run");
        }
        ctx.try_emit_event("run.started", Some(serde_json::json!({ "stages": plan })));

        let mut records = Vec::with_capacity(selected.len());
        for spec in selected {
            let id = spec.id;
            if self.cancellation.is_cancelled() {
                return self.interrupted(&ctx, records, None, started);
            }

            ctx.begin_step(id);
            ctx.try_emit_event("stage.started", Some(serde_json::json!({ "stage": id })));
            let stage_started = Instant::now();

            let execution = AssertUnwindSafe(spec.runner.execute(&ctx)).catch_unwind();
            let result = tokio::select! {
                biased;
                () = self.cancellation.cancelled() => None,
                result = execution => Some(result),
            };
            let duration = stage_started.elapsed();

            let output = match result {
                None => {
                    ctx.abandon_step();
                    return self.interrupted(&ctx, records, Some((id, duration)), started);
                }
                Some(Ok(Ok(output))) => output,
                Some(Ok(Err(err))) => StageOutput::from_error(&err),
                Some(Err(payload)) => {
                    StageOutput::from_error(&DeployError::Unexpected(panic_message(&*payload)))
                }
            };

            let record = StageRecord::from_output(id, &output, duration);
            match output.status {
                StageStatus::Fail => {
                    ctx.abandon_step();
                    let message = output.error.clone().unwrap_or_default();
                    let kind = output.error_kind.unwrap_or(ErrorKind::Unexpected);
                    error!(stage = %id, kind = %kind, "{} failed: {message}", id.title());
                    ctx.try_emit_event(
                        "stage.failed",
                        Some(serde_json::json!({
                            "stage": id,
                            "error": &message,
                            "error_kind": kind,
                            "duration_ms": record.duration_ms,
                        })),
                    );
                    records.push(record);
                    ctx.try_emit_event(
                        "run.failed",
                        Some(serde_json::json!({
                            "stage": id,
                            "error": &message,
                            "error_kind": kind,
                        })),
                    );
                    return self.report(
                        &ctx,
                        RunOutcome::Failed,
                        records,
                        None,
                        Some((message, kind)),
                        started,
                    );
                }
                StageStatus::Skip => {
                    ctx.end_step();
                    ctx.try_emit_event(
                        "stage.skipped",
                        Some(serde_json::json!({
                            "stage": id,
                            "reason": output.skip_reason,
                            "duration_ms": record.duration_ms,
                        })),
                    );
                }
                StageStatus::Ok => {
                    ctx.end_step();
                    ctx.try_emit_event(
                        "stage.completed",
                        Some(serde_json::json!({
                            "stage": id,
                            "duration_ms": record.duration_ms,
                        })),
                    );
                    ctx.record_facts(output.data);
                }
            }
            records.push(record);
        }

        let summary = RunSummary::new(
            ctx.config(),
            ctx.aws_account_id(),
            ctx.elapsed(),
            records.clone(),
        );
        info!(
            outcome = "success",
            elapsed_secs = summary.elapsed_secs,
            "Deployment completed successfully"
        );
        ctx.try_emit_event(
            "run.completed",
            Some(serde_json::json!({
                "elapsed_secs": summary.elapsed_secs,
                "stages": records.len(),
            })),
        );
        self.report(&ctx, RunOutcome::Succeeded, records, Some(summary), None, started)
    }

    fn reject(
        &self,
        config: DeploymentConfig,
        err: &ConfigurationError,
        started: Instant,
    ) -> RunReport {
        error!(flags = ?err.flags, "{err}");
        if let Some(hint) = &err.fix_hint {
            info!("{hint}");
        }
        self.event_sink.try_emit(
            "run.rejected",
            Some(serde_json::json!({
                "project": &config.project_name,
                "error": err.to_string(),
                "flags": &err.flags,
            })),
        );

        let identity = RunIdentity::new();
        RunReport {
            run_id: identity.run_id,
            started_at: identity.started_at,
            outcome: RunOutcome::Rejected,
            config,
            stages: Vec::new(),
            summary: None,
            error: Some(err.to_string()),
            error_kind: Some(ErrorKind::Configuration),
            duration_ms: millis(started.elapsed()),
        }
    }

    fn interrupted(
        &self,
        ctx: &RunContext,
        mut records: Vec<StageRecord>,
        abandoned: Option<(StageId, Duration)>,
        started: Instant,
    ) -> RunReport {
        let reason = self
            .cancellation
            .reason()
            .unwrap_or_else(|| DEFAULT_INTERRUPT_REASON.to_string());
        let err = DeployError::Interrupted(reason);
        warn!("Deployment interrupted by user");

        if let Some((id, duration)) = abandoned {
            records.push(StageRecord::from_output(
                id,
                &StageOutput::from_error(&err),
                duration,
            ));
        }
        ctx.try_emit_event(
            "run.interrupted",
            Some(serde_json::json!({
                "stage": abandoned.map(|(id, _)| id),
                "reason": err.to_string(),
            })),
        );

        self.report(
            ctx,
            RunOutcome::Interrupted,
            records,
            None,
            Some((err.to_string(), ErrorKind::Interrupted)),
            started,
        )
    }

    #[allow(clippy::unused_self)]
    fn report(
        &self,
        ctx: &RunContext,
        outcome: RunOutcome,
        stages: Vec<StageRecord>,
        summary: Option<RunSummary>,
        error: Option<(String, ErrorKind)>,
        started: Instant,
    ) -> RunReport {
        let (error, error_kind) = error.unzip();
        RunReport {
            run_id: ctx.identity().run_id,
            started_at: ctx.identity().started_at,
            outcome,
            config: ctx.config().clone(),
            stages,
            summary,
            error,
            error_kind,
            duration_ms: millis(started.elapsed()),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("stage panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("stage panicked: {message}")
    } else {
        "stage panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCommandRunner;
    use pretty_assertions::assert_eq;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Arc::new(ScriptedCommandRunner::new()))
    }

    #[test]
    fn test_plan_full() {
        let config = DeploymentConfig::builder("demo").build().unwrap();
        assert_eq!(orchestrator().plan(&config), StageId::ALL.to_vec());
    }

    #[test]
    fn test_plan_only() {
        let config = DeploymentConfig::builder("demo").plan_only(true).build().unwrap();
        assert_eq!(
            orchestrator().plan(&config),
            vec![
                StageId::Prerequisites,
                StageId::EnvironmentSetup,
                StageId::Tests,
                StageId::Infrastructure,
                StageId::ImageBuild,
            ]
        );
    }

    #[test]
    fn test_plan_infrastructure_only() {
        let config = DeploymentConfig::builder("demo")
            .infrastructure_only(true)
            .build()
            .unwrap();
        assert_eq!(
            orchestrator().plan(&config),
            vec![
                StageId::Prerequisites,
                StageId::EnvironmentSetup,
                StageId::Tests,
                StageId::Infrastructure,
            ]
        );
    }

    #[test]
    fn test_with_stage_replaces_in_place() {
        let stage = crate::stages::FnStage::new(StageId::Tests, |_| Ok(StageOutput::ok_empty()));
        let orchestrator = orchestrator().with_stage(StageSpec::new(Arc::new(stage)));
        let config = DeploymentConfig::builder("demo").build().unwrap();
        assert_eq!(orchestrator.plan(&config), StageId::ALL.to_vec());
    }

    #[test]
    fn test_with_stage_keeps_gating() {
        let stage = crate::stages::FnStage::new(StageId::Tests, |_| Ok(StageOutput::ok_empty()));
        let orchestrator = orchestrator().with_stage(StageSpec::new(Arc::new(stage)));
        let config = DeploymentConfig::builder("demo")
            .application_only(true)
            .build()
            .unwrap();
        assert!(!orchestrator.plan(&config).contains(&StageId::Tests));
    }

    #[test]
    fn test_with_stage_explicit_predicate() {
        let stage = crate::stages::FnStage::new(StageId::Tests, |_| Ok(StageOutput::ok_empty()));
        let orchestrator =
            orchestrator().with_stage(StageSpec::new(Arc::new(stage)).when(|_| true));
        let config = DeploymentConfig::builder("demo")
            .application_only(true)
            .build()
            .unwrap();
        assert!(orchestrator.plan(&config).contains(&StageId::Tests));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "stage panicked: boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "stage panicked: bang");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*payload), "stage panicked");
    }
}
