//! The context owned by one deployment run.

use super::RunIdentity;
use crate::config::DeploymentConfig;
use crate::core::StageId;
use crate::errors::{DeployError, StageExecutionError};
use crate::events::EventSink;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use chrono::Local;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Fact key under which the registry account is recorded.
pub const FACT_AWS_ACCOUNT_ID: &str = "aws_account_id";

/// Timer for the step currently running.
#[derive(Debug, Clone)]
struct StepTimer {
    stage: StageId,
    started: Instant,
}

/// State of a single run: configuration, collaborators, clocks and the
/// facts stages hand to each other.
///
/// Stages receive it by shared reference; only the orchestrator mutates
/// it, between stages.
pub struct RunContext {
    identity: RunIdentity,
    config: Arc<DeploymentConfig>,
    runner: Arc<dyn CommandRunner>,
    event_sink: Arc<dyn EventSink>,
    started: Instant,
    step: Option<StepTimer>,
    facts: HashMap<String, serde_json::Value>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.identity.run_id)
            .field("project", &self.config.project_name)
            .field("step", &self.step.as_ref().map(|s| s.stage))
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Creates a context and starts the run clock.
    #[must_use]
    pub fn new(
        config: Arc<DeploymentConfig>,
        runner: Arc<dyn CommandRunner>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            identity: RunIdentity::new(),
            config,
            runner,
            event_sink,
            started: Instant::now(),
            step: None,
            facts: HashMap::new(),
        }
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the deployment configuration.
    #[must_use]
    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    /// Returns the project directory.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        self.config.project_dir()
    }

    /// Returns the command runner.
    #[must_use]
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Time since the run started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Starts timing a step.
    pub fn begin_step(&mut self, stage: StageId) {
        info!(stage = %stage, "Starting: {} at {}", stage.title(), wall_clock());
        self.step = Some(StepTimer {
            stage,
            started: Instant::now(),
        });
    }

    /// Stops timing the current step and returns its duration.
    pub fn end_step(&mut self) -> Option<Duration> {
        let step = self.step.take()?;
        let duration = step.started.elapsed();
        info!(
            stage = %step.stage,
            duration_secs = duration.as_secs(),
            "Completed: {} at {} ({}s)",
            step.stage.title(),
            wall_clock(),
            duration.as_secs()
        );
        Some(duration)
    }

    /// Abandons the current step without a completion message.
    pub fn abandon_step(&mut self) -> Option<Duration> {
        self.step.take().map(|step| step.started.elapsed())
    }

    /// Records facts produced by a stage.
    pub fn record_facts(&mut self, facts: impl IntoIterator<Item = (String, serde_json::Value)>) {
        self.facts.extend(facts);
    }

    /// Gets a recorded fact.
    #[must_use]
    pub fn fact(&self, key: &str) -> Option<&serde_json::Value> {
        self.facts.get(key)
    }

    /// Gets a recorded string fact.
    #[must_use]
    pub fn fact_str(&self, key: &str) -> Option<&str> {
        self.fact(key).and_then(serde_json::Value::as_str)
    }

    /// The registry account: pinned in config, else resolved at runtime.
    #[must_use]
    pub fn aws_account_id(&self) -> Option<&str> {
        self.config
            .aws_account_id
            .as_deref()
            .or_else(|| self.fact_str(FACT_AWS_ACCOUNT_ID))
    }

    /// Runs a command, returning its output whatever the exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be launched.
    pub async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, DeployError> {
        Ok(self.runner.run(&spec).await?)
    }

    /// Runs a command and treats a non-zero exit status as stage failure.
    ///
    /// # Errors
    ///
    /// Returns [`StageExecutionError`] on a non-zero status, or an error
    /// if the command cannot be launched.
    pub async fn run_checked(
        &self,
        action: &str,
        spec: CommandSpec,
    ) -> Result<CommandOutput, DeployError> {
        let output = self.run(spec).await?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(StageExecutionError::new(action, output.status)
                .with_stderr(&output.stderr)
                .into())
        }
    }

    /// Emits an event enriched with the run's correlation fields.
    pub fn try_emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        let mut enriched = data.unwrap_or_else(|| serde_json::json!({}));

        if let serde_json::Value::Object(ref mut map) = enriched {
            map.insert(
                "run_id".to_string(),
                serde_json::json!(self.identity.run_id.to_string()),
            );
            map.insert(
                "project".to_string(),
                serde_json::json!(&self.config.project_name),
            );
            map.insert(
                "environment".to_string(),
                serde_json::json!(&self.config.environment),
            );
        }

        self.event_sink.try_emit(event_type, Some(enriched));
    }
}

fn wall_clock() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
