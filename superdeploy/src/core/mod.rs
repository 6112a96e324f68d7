//! Core domain model types.
//!
//! - Stage identity and status enums
//! - Stage output type with factory methods

mod output;
#[cfg(test)]
mod output_tests;
mod status;

pub use output::StageOutput;
pub use status::{StageId, StageStatus};
