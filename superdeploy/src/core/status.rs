//! Stage identity and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stages of a deployment, in their fixed execution order.
///
/// The declaration order is the run order; [`StageId::ALL`] and the
/// derived `Ord` both follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Tools, credentials and container engine are available.
    Prerequisites,
    /// Virtual environment and dependency installation.
    EnvironmentSetup,
    /// Project test suite.
    Tests,
    /// Infrastructure plan or apply.
    Infrastructure,
    /// Container image build.
    ImageBuild,
    /// Registry login, tag and push.
    RegistryPush,
    /// Service update.
    ApplicationDeploy,
    /// Post-deployment verification.
    HealthCheck,
}

impl StageId {
    /// Every stage in execution order.
    pub const ALL: [Self; 8] = [
        Self::Prerequisites,
        Self::EnvironmentSetup,
        Self::Tests,
        Self::Infrastructure,
        Self::ImageBuild,
        Self::RegistryPush,
        Self::ApplicationDeploy,
        Self::HealthCheck,
    ];

    /// The human-readable step title used in timing messages.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Prerequisites => "Prerequisites Check",
            Self::EnvironmentSetup => "Python Environment Setup",
            Self::Tests => "Test Execution",
            Self::Infrastructure => "Infrastructure Deployment",
            Self::ImageBuild => "Docker Build",
            Self::RegistryPush => "ECR Push",
            Self::ApplicationDeploy => "Application Deployment",
            Self::HealthCheck => "Health Check",
        }
    }

    /// Returns true if the stage changes remote state.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::RegistryPush | Self::ApplicationDeploy | Self::HealthCheck
        )
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prerequisites => write!(f, "prerequisites"),
            Self::EnvironmentSetup => write!(f, "environment_setup"),
            Self::Tests => write!(f, "tests"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::ImageBuild => write!(f, "image_build"),
            Self::RegistryPush => write!(f, "registry_push"),
            Self::ApplicationDeploy => write!(f, "application_deploy"),
            Self::HealthCheck => write!(f, "health_check"),
        }
    }
}

/// The outcome of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage had nothing to do and was skipped with a warning.
    Skip,
    /// Stage failed; the run stops here.
    Fail,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Skip => write!(f, "skip"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl StageStatus {
    /// Returns true if the run may continue past this status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::Skip)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail)
    }
}
