//! Workflow orchestration.
//!
//! This module provides:
//! - Stage specifications and the default stage table
//! - The orchestrator that runs them with short-circuit semantics
//! - Cancellation of a running deployment
//! - The run report

mod cancellation;
mod orchestrator;
mod report;
mod spec;

pub use cancellation::CancellationToken;
pub use orchestrator::Orchestrator;
pub use report::{RunOutcome, RunReport};
pub use spec::{default_stages, StagePredicate, StageSpec};
