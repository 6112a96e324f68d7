//! External command execution.

mod command;

#[cfg(test)]
pub use command::MockCommandRunner;
pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemCommandRunner};
