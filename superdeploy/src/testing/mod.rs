//! Testing utilities for deployment workflows.
//!
//! - A scripted command runner standing in for every collaborator
//! - Scratch project directories (crate tests only)

#[cfg(test)]
pub(crate) mod fixtures;
mod mocks;

pub use crate::events::CollectingEventSink;
pub use mocks::ScriptedCommandRunner;
