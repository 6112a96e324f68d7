//! Error types for the deployment workflow.
//!
//! Every error is terminal for a run. The variants of [`DeployError`]
//! mirror the classes the orchestrator reports: configuration,
//! prerequisite, stage execution, interruption and unexpected failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for deployment operations.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The flag set is invalid.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// A required tool or credential is unavailable.
    #[error("{0}")]
    Prerequisite(#[from] PrerequisiteError),

    /// A collaborator reported a non-zero status.
    #[error("{0}")]
    StageExecution(#[from] StageExecutionError),

    /// The run was interrupted by the user.
    #[error("Deployment interrupted: {0}")]
    Interrupted(String),

    /// A collaborator could not be invoked at all.
    #[error("{0}")]
    Command(#[from] CommandError),

    /// A default asset could not be rendered.
    #[error("{0}")]
    Template(#[from] TemplateError),

    /// Any other failure surfaced while running a stage.
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Returns the taxonomy class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Prerequisite(_) => ErrorKind::Prerequisite,
            Self::StageExecution(_) => ErrorKind::StageExecution,
            Self::Interrupted(_) => ErrorKind::Interrupted,
            Self::Command(_) | Self::Template(_) | Self::Unexpected(_) | Self::Io(_) => {
                ErrorKind::Unexpected
            }
        }
    }
}

/// Classes of terminal errors, used in logs and run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid flag combination, detected before any stage runs.
    Configuration,
    /// Missing tool, bad credentials or stopped container engine.
    Prerequisite,
    /// A collaborator returned a non-zero status.
    StageExecution,
    /// External interrupt signal.
    Interrupted,
    /// Anything else caught at the orchestrator boundary.
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Prerequisite => write!(f, "prerequisite"),
            Self::StageExecution => write!(f, "stage_execution"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Error raised when the deployment flags are invalid.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// The flags involved in the error.
    pub flags: Vec<String>,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            flags: Vec::new(),
            fix_hint: None,
        }
    }

    /// Sets the flags involved.
    #[must_use]
    pub fn with_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// The error for `--infrastructure-only` combined with `--application-only`.
    #[must_use]
    pub fn exclusive_modes() -> Self {
        Self::new("Cannot specify both --infrastructure-only and --application-only")
            .with_flags(["--infrastructure-only", "--application-only"])
            .with_fix_hint("Drop one of the flags, or neither to run the full deployment.")
    }
}

/// Errors raised by the prerequisite check.
#[derive(Debug, Clone, Error)]
pub enum PrerequisiteError {
    /// Required tools are not on PATH.
    #[error("Missing required tools: {}", tools.join(", "))]
    MissingTools {
        /// The missing tool names, in check order.
        tools: Vec<String>,
    },

    /// Cloud credentials could not be verified.
    #[error("AWS credentials not configured")]
    InvalidCredentials,

    /// The container engine did not answer.
    #[error("Docker is not running")]
    EngineNotRunning,
}

/// Error raised when a collaborator exits with a non-zero status.
#[derive(Debug, Clone, Error)]
#[error("{action} failed (exit status {status}){}", stderr_suffix(.stderr.as_deref()))]
pub struct StageExecutionError {
    /// What the stage was trying to do, e.g. "Docker build".
    pub action: String,
    /// The collaborator's exit status.
    pub status: i32,
    /// Trimmed stderr, when it was captured.
    pub stderr: Option<String>,
}

impl StageExecutionError {
    /// Creates a new stage execution error.
    #[must_use]
    pub fn new(action: impl Into<String>, status: i32) -> Self {
        Self {
            action: action.into(),
            status,
            stderr: None,
        }
    }

    /// Attaches captured stderr. Blank output is ignored.
    #[must_use]
    pub fn with_stderr(mut self, stderr: &str) -> Self {
        let trimmed = stderr.trim();
        if !trimmed.is_empty() {
            self.stderr = Some(trimmed.to_string());
        }
        self
    }
}

fn stderr_suffix(stderr: Option<&str>) -> String {
    stderr.map(|text| format!(": {text}")).unwrap_or_default()
}

/// Errors from launching an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not be spawned.
    #[error("Failed to run command {command}: {source}")]
    Spawn {
        /// The rendered command line.
        command: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The command's stdin could not be written.
    #[error("Failed to write stdin of {command}: {source}")]
    Stdin {
        /// The rendered command line.
        command: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The command was terminated by a signal.
    #[error("Command {command} was terminated by a signal")]
    Terminated {
        /// The rendered command line.
        command: String,
    },
}

/// Errors from rendering a default asset.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// A placeholder has no value in the substitution map.
    #[error("Template {template} references unknown key '{key}'")]
    MissingKey {
        /// The template name.
        template: String,
        /// The unresolved placeholder key.
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_modes_error() {
        let err = ConfigurationError::exclusive_modes();
        assert!(err.to_string().contains("--infrastructure-only"));
        assert!(err.to_string().contains("--application-only"));
        assert_eq!(err.flags.len(), 2);
        assert!(err.fix_hint.is_some());
    }

    #[test]
    fn test_missing_tools_message() {
        let err = PrerequisiteError::MissingTools {
            tools: vec!["docker".to_string(), "aws".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required tools: docker, aws");
    }

    #[test]
    fn test_stage_execution_error_stderr() {
        let err = StageExecutionError::new("Docker build", 2).with_stderr("  \n");
        assert!(err.stderr.is_none());

        let err = StageExecutionError::new("Docker build", 2).with_stderr("no space left\n");
        assert_eq!(err.stderr.as_deref(), Some("no space left"));
        assert_eq!(err.to_string(), "Docker build failed (exit status 2): no space left");

        let err = StageExecutionError::new("Docker build", 2);
        assert_eq!(err.to_string(), "Docker build failed (exit status 2)");
    }

    #[test]
    fn test_error_kind_mapping() {
        let err: DeployError = ConfigurationError::exclusive_modes().into();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err: DeployError = PrerequisiteError::EngineNotRunning.into();
        assert_eq!(err.kind(), ErrorKind::Prerequisite);

        let err: DeployError = StageExecutionError::new("Tests", 1).into();
        assert_eq!(err.kind(), ErrorKind::StageExecution);

        let err = DeployError::Interrupted("ctrl-c".to_string());
        assert_eq!(err.kind(), ErrorKind::Interrupted);

        let err: DeployError = TemplateError::MissingKey {
            template: "Dockerfile".to_string(),
            key: "port".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_error_kind_serialize() {
        let json = serde_json::to_string(&ErrorKind::StageExecution).unwrap();
        assert_eq!(json, r#""stage_execution""#);
        assert_eq!(ErrorKind::Interrupted.to_string(), "interrupted");
    }
}
