//! Project test suite execution.

use super::environment::venv_bin;
use super::Stage;
use crate::context::RunContext;
use crate::core::{StageId, StageOutput};
use crate::errors::DeployError;
use crate::exec::CommandSpec;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const TEST_DIRS: [&str; 2] = ["tests", "test"];

/// Returns true if the project has a discoverable test suite.
///
/// Looks for a `tests/` or `test/` directory, or a top-level
/// `test_*.py` / `*_test.py` module.
#[must_use]
pub fn has_tests(dir: &Path) -> bool {
    if TEST_DIRS.iter().any(|name| dir.join(name).exists()) {
        return true;
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .any(|entry| is_test_module(&entry.file_name().to_string_lossy()))
}

fn is_test_module(name: &str) -> bool {
    name.strip_suffix(".py")
        .is_some_and(|stem| stem.starts_with("test_") || stem.ends_with("_test"))
}

/// Runs the suite with pytest when the environment has it, else with
/// `unittest discover`. A project without tests is skipped, not failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestSuiteStage;

#[async_trait]
impl Stage for TestSuiteStage {
    fn id(&self) -> StageId {
        StageId::Tests
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageOutput, DeployError> {
        let dir = ctx.project_dir();

        if !has_tests(dir) {
            warn!("No tests found - skipping test execution");
            return Ok(StageOutput::skip("No tests found"));
        }

        let python = venv_bin("python");
        let probe = ctx
            .run(
                CommandSpec::new(&python)
                    .args(["-m", "pytest", "--version"])
                    .current_dir(dir)
                    .captured(),
            )
            .await?;

        let (runner, command) = if probe.is_success() {
            ("pytest", CommandSpec::new(&python).args(["-m", "pytest", "-v"]))
        } else {
            (
                "unittest",
                CommandSpec::new(&python).args(["-m", "unittest", "discover", "-v"]),
            )
        };

        info!(runner, "Running tests with {runner}...");
        ctx.run_checked("Tests", command.current_dir(dir)).await?;

        info!(outcome = "success", "All tests passed");
        Ok(StageOutput::ok_value("test_runner", serde_json::json!(runner)))
    }
}
