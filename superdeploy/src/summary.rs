//! Run records and the end-of-run summary.

use crate::config::DeploymentConfig;
use crate::core::{StageId, StageOutput, StageStatus};
use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

/// Follow-up suggestions printed after a successful deployment.
pub const NEXT_STEPS: [&str; 4] = [
    "Monitor application logs in CloudWatch",
    "Test application endpoints",
    "Set up monitoring and alerts",
    "Configure CI/CD pipeline",
];

/// What happened to one stage of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// The stage.
    pub stage: StageId,
    /// Final status.
    pub status: StageStatus,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Skip reason or error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Error class of a failed stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl StageRecord {
    /// Records a finished stage.
    #[must_use]
    pub fn from_output(stage: StageId, output: &StageOutput, duration: Duration) -> Self {
        Self {
            stage,
            status: output.status,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            detail: output.error.clone().or_else(|| output.skip_reason.clone()),
            error_kind: output.error_kind,
        }
    }
}

/// Summary of a successful run: elapsed time and the resolved
/// deployment targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Project name.
    pub project: String,
    /// Deployment environment.
    pub environment: String,
    /// AWS region.
    pub aws_region: String,
    /// Image tag.
    pub image_tag: String,
    /// Registry repository.
    pub ecr_repository: String,
    /// Cluster running the service.
    pub ecs_cluster: String,
    /// Updated service.
    pub ecs_service: String,
    /// Whether the run was a preview.
    pub plan_only: bool,
    /// Total run time in whole seconds.
    pub elapsed_secs: u64,
    /// Stage records in execution order.
    pub stages: Vec<StageRecord>,
}

impl RunSummary {
    /// Builds the summary from the run's configuration and records.
    #[must_use]
    pub fn new(
        config: &DeploymentConfig,
        account: Option<&str>,
        elapsed: Duration,
        stages: Vec<StageRecord>,
    ) -> Self {
        Self {
            project: config.project_name.clone(),
            environment: config.environment.clone(),
            aws_region: config.aws_region.clone(),
            image_tag: config.image_tag.clone(),
            ecr_repository: config.registry_repository(account),
            ecs_cluster: config.cluster_name(),
            ecs_service: config.service_name(),
            plan_only: config.plan_only,
            elapsed_secs: elapsed.as_secs(),
            stages,
        }
    }

    /// Renders the summary for the terminal.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "==== Deployment Summary ====");
        if self.plan_only {
            let _ = writeln!(out, "Python deployment plan completed successfully!");
        } else {
            let _ = writeln!(out, "Python deployment completed successfully!");
        }
        let _ = writeln!(out, "Total deployment time: {}s", self.elapsed_secs);
        let _ = writeln!(out);

        let _ = writeln!(out, "Deployment Details:");
        for (label, value) in [
            ("Project", &self.project),
            ("Environment", &self.environment),
            ("Image Tag", &self.image_tag),
            ("ECR Repository", &self.ecr_repository),
            ("ECS Cluster", &self.ecs_cluster),
            ("ECS Service", &self.ecs_service),
        ] {
            let _ = writeln!(out, "   • {label}: {value}");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Stages:");
        for record in &self.stages {
            let _ = writeln!(
                out,
                "   • {}: {} ({}s)",
                record.stage.title(),
                record.status,
                record.duration_ms / 1000
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Next Steps:");
        for step in NEXT_STEPS {
            let _ = writeln!(out, "   • {step}");
        }
        out
    }
}
