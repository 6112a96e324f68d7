//! Scripted collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::errors::CommandError;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};

#[derive(Debug, Clone)]
enum Response {
    Output(CommandOutput),
    Hang,
    SpawnError,
}

#[derive(Debug, Clone)]
struct Rule {
    prefix: Vec<String>,
    response: Response,
}

/// A command runner that records every call and answers from a script.
///
/// Commands with no matching rule succeed silently. When several rules
/// match, the most recently added one wins. Every tool is found on PATH
/// unless removed with [`ScriptedCommandRunner::without_tool`].
#[derive(Debug, Default)]
pub struct ScriptedCommandRunner {
    rules: Mutex<Vec<Rule>>,
    invocations: Mutex<Vec<CommandSpec>>,
    lookups: Mutex<Vec<String>>,
    missing_tools: Mutex<HashSet<String>>,
}

impl ScriptedCommandRunner {
    /// Creates a runner where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_rule(&self, prefix: &[&str], response: Response) {
        self.rules.lock().push(Rule {
            prefix: prefix.iter().map(|w| (*w).to_string()).collect(),
            response,
        });
    }

    /// Answers commands starting with `prefix` with the given output.
    pub fn on(&self, prefix: &[&str], output: CommandOutput) {
        self.push_rule(prefix, Response::Output(output));
    }

    /// Makes commands starting with `prefix` exit with `status`.
    pub fn fail_on(&self, prefix: &[&str], status: i32) {
        self.on(prefix, CommandOutput::failure(status));
    }

    /// Makes commands starting with `prefix` never finish.
    pub fn hang_on(&self, prefix: &[&str]) {
        self.push_rule(prefix, Response::Hang);
    }

    /// Makes commands starting with `prefix` fail to launch.
    pub fn error_on(&self, prefix: &[&str]) {
        self.push_rule(prefix, Response::SpawnError);
    }

    /// Removes a tool from the simulated PATH.
    pub fn without_tool(&self, tool: &str) {
        self.missing_tools.lock().insert(tool.to_string());
    }

    /// Returns every command run so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.lock().clone()
    }

    /// Returns every command line run so far, in order.
    #[must_use]
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations.lock().iter().map(CommandSpec::display).collect()
    }

    /// Returns every tool looked up so far, in order.
    #[must_use]
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    /// Total collaborator calls: commands plus tool lookups.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.invocations.lock().len() + self.lookups.lock().len()
    }

    /// Returns true if any command starting with `prefix` was run.
    #[must_use]
    pub fn was_invoked(&self, prefix: &[&str]) -> bool {
        self.count_invocations(prefix) > 0
    }

    /// Counts commands starting with `prefix`.
    #[must_use]
    pub fn count_invocations(&self, prefix: &[&str]) -> usize {
        self.invocations
            .lock()
            .iter()
            .filter(|spec| spec.starts_with(prefix))
            .count()
    }

    /// Returns the first command starting with `prefix`.
    #[must_use]
    pub fn find_invocation(&self, prefix: &[&str]) -> Option<CommandSpec> {
        self.invocations
            .lock()
            .iter()
            .find(|spec| spec.starts_with(prefix))
            .cloned()
    }

    fn response_for(&self, spec: &CommandSpec) -> Option<Response> {
        self.rules
            .lock()
            .iter()
            .rev()
            .find(|rule| {
                let words: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
                spec.starts_with(&words)
            })
            .map(|rule| rule.response.clone())
    }
}

#[async_trait]
impl CommandRunner for ScriptedCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        self.invocations.lock().push(spec.clone());

        match self.response_for(spec) {
            None => Ok(CommandOutput::success()),
            Some(Response::Output(output)) => Ok(output),
            Some(Response::Hang) => std::future::pending().await,
            Some(Response::SpawnError) => Err(CommandError::Spawn {
                command: spec.display(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
        }
    }

    fn locate(&self, tool: &str) -> Option<PathBuf> {
        self.lookups.lock().push(tool.to_string());
        if self.missing_tools.lock().contains(tool) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(tool))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_success_and_recording() {
        let runner = ScriptedCommandRunner::new();
        let output = runner
            .run(&CommandSpec::new("docker").arg("info"))
            .await
            .unwrap();

        assert!(output.is_success());
        assert_eq!(runner.command_lines(), vec!["docker info"]);
        assert!(runner.was_invoked(&["docker"]));
        assert!(!runner.was_invoked(&["aws"]));
    }

    #[tokio::test]
    async fn test_latest_rule_wins() {
        let runner = ScriptedCommandRunner::new();
        runner.fail_on(&["docker"], 1);
        runner.on(&["docker", "info"], CommandOutput::with_stdout("ok"));

        let info = runner.run(&CommandSpec::new("docker").arg("info")).await.unwrap();
        assert_eq!(info.stdout, "ok");

        let build = runner.run(&CommandSpec::new("docker").arg("build")).await.unwrap();
        assert_eq!(build.status, 1);
        assert_eq!(runner.count_invocations(&["docker"]), 2);
    }

    #[tokio::test]
    async fn test_spawn_error() {
        let runner = ScriptedCommandRunner::new();
        runner.error_on(&["terraform"]);
        let err = runner.run(&CommandSpec::new("terraform").arg("init")).await.unwrap_err();
        assert!(err.to_string().contains("terraform init"));
    }

    #[test]
    fn test_tool_lookup() {
        let runner = ScriptedCommandRunner::new();
        runner.without_tool("docker");

        assert!(runner.locate("aws").is_some());
        assert!(runner.locate("docker").is_none());
        assert_eq!(runner.lookups(), vec!["aws", "docker"]);
        assert_eq!(runner.total_calls(), 2);
    }
}
