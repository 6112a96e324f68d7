//! Stage trait and the deployment stages.
//!
//! Each stage drives one group of collaborator calls. Stages never touch
//! the process directly: every external tool goes through the run
//! context's [`CommandRunner`](crate::exec::CommandRunner).

mod environment;
mod health;
mod image;
mod infrastructure;
mod prerequisites;
mod registry;
mod release;
mod test_suite;

pub use environment::EnvironmentSetupStage;
pub use health::HealthCheckStage;
pub use image::ImageBuildStage;
pub use infrastructure::InfrastructureStage;
pub use prerequisites::PrerequisitesStage;
pub use registry::RegistryPushStage;
pub use release::ApplicationDeployStage;
pub use test_suite::TestSuiteStage;

use crate::context::RunContext;
use crate::core::{StageId, StageOutput};
use crate::errors::DeployError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for deployment stages.
///
/// A stage returns `Ok` with a success or skip output, or an error that
/// ends the run. The orchestrator turns errors into failed outputs.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the stage this implementation runs as.
    fn id(&self) -> StageId;

    /// Returns the name of the stage.
    fn name(&self) -> &str {
        self.id().title()
    }

    /// Executes the stage.
    ///
    /// # Errors
    ///
    /// Returns an error if a collaborator fails or cannot be launched.
    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(&RunContext) -> Result<StageOutput, DeployError> + Send + Sync,
{
    id: StageId,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&RunContext) -> Result<StageOutput, DeployError> + Send + Sync,
{
    /// Creates a new function-based stage running as `id`.
    pub fn new(id: StageId, func: F) -> Self {
        Self { id, func }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&RunContext) -> Result<StageOutput, DeployError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("id", &self.id).finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&RunContext) -> Result<StageOutput, DeployError> + Send + Sync,
{
    fn id(&self) -> StageId {
        self.id
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        (self.func)(ctx)
    }
}
