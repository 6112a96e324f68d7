//! Stage specifications and the default stage table.

use crate::config::DeploymentConfig;
use crate::core::StageId;
use crate::stages::{
    ApplicationDeployStage, EnvironmentSetupStage, HealthCheckStage, ImageBuildStage,
    InfrastructureStage, PrerequisitesStage, RegistryPushStage, Stage, TestSuiteStage,
};
use std::sync::Arc;

/// Decides from the flags whether a stage belongs to the run.
pub type StagePredicate = fn(&DeploymentConfig) -> bool;

/// Specification for a single stage of the workflow.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// The stage this entry runs as.
    pub id: StageId,
    /// The stage implementation.
    pub runner: Arc<dyn Stage>,
    /// Membership predicate; `None` runs the stage on every invocation.
    pub predicate: Option<StagePredicate>,
}

impl StageSpec {
    /// Creates a stage without a membership predicate.
    #[must_use]
    pub fn new(runner: Arc<dyn Stage>) -> Self {
        Self {
            id: runner.id(),
            runner,
            predicate: None,
        }
    }

    /// Sets the membership predicate.
    #[must_use]
    pub fn when(mut self, predicate: StagePredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Returns true if the stage runs under `config`.
    #[must_use]
    pub fn should_run(&self, config: &DeploymentConfig) -> bool {
        self.predicate.map_or(true, |predicate| predicate(config))
    }
}

/// The full workflow in execution order.
///
/// Flags only change membership: setup, tests and infrastructure are
/// left out by `application_only`, the image build by
/// `infrastructure_only`, and the release stages additionally by
/// `plan_only`.
#[must_use]
pub fn default_stages() -> Vec<StageSpec> {
    vec![
        StageSpec::new(Arc::new(PrerequisitesStage)),
        StageSpec::new(Arc::new(EnvironmentSetupStage)).when(DeploymentConfig::runs_infrastructure),
        StageSpec::new(Arc::new(TestSuiteStage)).when(DeploymentConfig::runs_infrastructure),
        StageSpec::new(Arc::new(InfrastructureStage)).when(DeploymentConfig::runs_infrastructure),
        StageSpec::new(Arc::new(ImageBuildStage)).when(DeploymentConfig::runs_application),
        StageSpec::new(Arc::new(RegistryPushStage)).when(DeploymentConfig::runs_release),
        StageSpec::new(Arc::new(ApplicationDeployStage)).when(DeploymentConfig::runs_release),
        StageSpec::new(Arc::new(HealthCheckStage)).when(DeploymentConfig::runs_release),
    ]
}
