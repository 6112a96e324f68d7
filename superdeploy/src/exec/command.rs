//! Command execution interface used by every stage.

use crate::errors::CommandError;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// A single external command invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments, passed verbatim.
    pub args: Vec<String>,
    /// Working directory; the process working directory when `None`.
    pub cwd: Option<PathBuf>,
    /// Capture stdout/stderr instead of streaming them to the terminal.
    pub capture: bool,
    /// Data written to the command's stdin.
    pub stdin: Option<String>,
}

impl CommandSpec {
    /// Creates a streamed command with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            capture: false,
            stdin: None,
        }
    }

    /// Appends arguments.
    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Captures output instead of streaming it.
    #[must_use]
    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Pipes the given data to stdin.
    #[must_use]
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Returns the command line as a single string.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns true if the command line starts with the given words.
    #[must_use]
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        let mut words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        prefix.iter().all(|expected| words.next() == Some(*expected))
    }
}

// stdin may carry a registry password
impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("capture", &self.capture)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status code.
    pub status: i32,
    /// Captured stdout; empty for streamed commands.
    pub stdout: String,
    /// Captured stderr; empty for streamed commands.
    pub stderr: String,
}

impl CommandOutput {
    /// A successful, silent result.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// A successful result with the given stdout.
    #[must_use]
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// A failed result with the given status.
    #[must_use]
    pub fn failure(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Returns true if the command exited with status zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Capability to run external tools.
///
/// Every collaborator (tool lookup, credential check, installer, test
/// runner, infrastructure tool, image builder, registry client, service
/// updater) is reached through this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion.
    ///
    /// A non-zero exit status is returned as `Ok`; only failures to launch
    /// or wait on the process are errors.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;

    /// Resolves a tool on PATH.
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

/// Runs commands as real child processes.
///
/// Children are killed if the stage awaiting them is dropped, so an
/// interrupted run leaves nothing behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Creates a new system runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let rendered = spec.display();
        debug!(command = %rendered, cwd = ?spec.cwd, capture = spec.capture, "Running command");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args).kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        if spec.capture {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        if spec.stdin.is_some() {
            command.stdin(Stdio::piped());
        } else if spec.capture {
            command.stdin(Stdio::null());
        }

        let mut child = command.spawn().map_err(|source| CommandError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        if let (Some(input), Some(mut handle)) = (spec.stdin.as_deref(), child.stdin.take()) {
            handle
                .write_all(input.as_bytes())
                .await
                .map_err(|source| CommandError::Stdin {
                    command: rendered.clone(),
                    source,
                })?;
            // closing stdin lets the child see EOF
            drop(handle);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: rendered.clone(),
                source,
            })?;
        let status = output
            .status
            .code()
            .ok_or(CommandError::Terminated { command: rendered })?;

        Ok(CommandOutput {
            status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn locate(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = CommandSpec::new("docker")
            .args(["build", "-t"])
            .arg("demo:latest")
            .arg(".")
            .current_dir("/srv/app")
            .captured();

        assert_eq!(spec.display(), "docker build -t demo:latest .");
        assert_eq!(spec.cwd, Some(PathBuf::from("/srv/app")));
        assert!(spec.capture);
        assert!(spec.starts_with(&["docker", "build"]));
        assert!(!spec.starts_with(&["docker", "push"]));
        assert!(spec.starts_with(&[]));
    }

    #[test]
    fn test_spec_debug_redacts_stdin() {
        let spec = CommandSpec::new("docker").arg("login").with_stdin("hunter2");
        let rendered = format!("{spec:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_output_status() {
        assert!(CommandOutput::success().is_success());
        assert!(CommandOutput::with_stdout("ok").is_success());
        assert!(!CommandOutput::failure(2).is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_output() {
        let runner = SystemCommandRunner::new();
        if runner.locate("sh").is_none() {
            return;
        }

        let spec = CommandSpec::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .captured();
        let output = runner.run(&spec).await.unwrap();

        assert_eq!(output.status, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_pipes_stdin() {
        let runner = SystemCommandRunner::new();
        if runner.locate("cat").is_none() {
            return;
        }

        let spec = CommandSpec::new("cat").captured().with_stdin("secret-token");
        let output = runner.run(&spec).await.unwrap();

        assert!(output.is_success());
        assert_eq!(output.stdout, "secret-token");
    }

    #[tokio::test]
    async fn test_system_runner_spawn_failure() {
        let runner = SystemCommandRunner::new();
        let spec = CommandSpec::new("superdeploy-definitely-not-a-tool").captured();
        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
