//! # SuperDeploy
//!
//! A flag-gated deployment workflow for containerized Python services.
//!
//! A run checks prerequisites, prepares the Python environment, runs the
//! test suite, provisions infrastructure with Terraform, builds and pushes
//! the container image, updates the ECS service and waits for it to be
//! healthy. Flags only decide which of these stages belong to the run;
//! their order never changes and the first failure ends the run.
//!
//! - **Stages**: one unit of work each, driving external tools through a
//!   [`CommandRunner`](exec::CommandRunner)
//! - **Orchestrator**: validation, ordering, short-circuit and interruption
//! - **Events**: lifecycle events sent to an explicit sink
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use superdeploy::prelude::*;
//!
//! let config = DeploymentConfig::builder("myapp").plan_only(true).build()?;
//! let report = Orchestrator::new(Arc::new(SystemCommandRunner::new()))
//!     .with_event_sink(Arc::new(LoggingEventSink::info()))
//!     .run(config)
//!     .await;
//! std::process::exit(report.exit_code());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod exec;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod summary;
pub mod templates;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{DeploymentConfig, DeploymentConfigBuilder};
    pub use crate::context::{RunContext, RunIdentity};
    pub use crate::core::{StageId, StageOutput, StageStatus};
    pub use crate::errors::{
        CommandError, ConfigurationError, DeployError, ErrorKind, PrerequisiteError,
        StageExecutionError, TemplateError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::exec::{CommandOutput, CommandRunner, CommandSpec, SystemCommandRunner};
    pub use crate::pipeline::{
        CancellationToken, Orchestrator, RunOutcome, RunReport, StageSpec,
    };
    pub use crate::stages::Stage;
    pub use crate::summary::{RunSummary, StageRecord};
    pub use std::sync::Arc;
}
