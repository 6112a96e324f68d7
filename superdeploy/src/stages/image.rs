//! Container image build.

use super::Stage;
use crate::context::RunContext;
use crate::core::{StageId, StageOutput};
use crate::errors::DeployError;
use crate::exec::CommandSpec;
use crate::templates::{self, Asset};
use async_trait::async_trait;
use tracing::info;

/// Builds `project:tag` from the project directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageBuildStage;

#[async_trait]
impl Stage for ImageBuildStage {
    fn id(&self) -> StageId {
        StageId::ImageBuild
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        let values = templates::substitutions(ctx.config());
        if templates::materialize(Asset::Dockerfile, ctx.project_dir(), &values)? {
            info!("Created default Dockerfile");
        }

        let image = ctx.config().local_image();
        info!(image = %image, "Building image: {image}");
        ctx.run_checked(
            "Docker build",
            CommandSpec::new("docker")
                .args(["build", "-t", image.as_str(), "."])
                .current_dir(ctx.project_dir()),
        )
        .await?;

        info!(outcome = "success", "Docker image built: {image}");
        Ok(StageOutput::ok_value("image", serde_json::json!(image)))
    }
}
