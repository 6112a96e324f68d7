//! Scratch project directories for tests.

use crate::config::{DeploymentConfig, DeploymentConfigBuilder};
use crate::context::RunContext;
use crate::events::NoOpEventSink;
use crate::exec::CommandRunner;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A throwaway project directory, removed on drop.
#[derive(Debug)]
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Creates an empty project directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp project dir"),
        }
    }

    /// Creates a project that already has every default artifact and a
    /// test suite.
    pub fn complete() -> Self {
        let project = Self::new();
        project.write("requirements.txt", "flask==2.3.3\n");
        project.write("Dockerfile", "FROM scratch\n");
        project.write("terraform/main.tf", "# existing\n");
        project.write("terraform/variables.tf", "# existing\n");
        project.write("tests/test_app.py", "def test_ok():\n    assert True\n");
        project
    }

    /// Returns the project root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Resolves a path inside the project.
    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes a file, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, content).expect("write project file");
    }

    /// Reads a file.
    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.join(relative)).expect("read project file")
    }

    /// Returns true if the path exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.join(relative).exists()
    }

    /// A config builder rooted here, with no health check delay.
    pub fn config(&self, project_name: &str) -> DeploymentConfigBuilder {
        DeploymentConfig::builder(project_name)
            .project_dir(self.path())
            .health_settle_secs(0)
    }
}

/// A run context with no event sink, for driving a single stage.
pub fn run_context(config: DeploymentConfig, runner: Arc<dyn CommandRunner>) -> RunContext {
    RunContext::new(Arc::new(config), runner, Arc::new(NoOpEventSink))
}
