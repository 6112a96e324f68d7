//! Context management for a deployment run.
//!
//! - Run identity for correlating events and reports
//! - The run context owning configuration, collaborators and timers

#[cfg(test)]
mod context_tests;
mod execution;
mod identity;

pub use execution::{RunContext, FACT_AWS_ACCOUNT_ID};
pub use identity::RunIdentity;
