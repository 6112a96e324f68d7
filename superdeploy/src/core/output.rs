//! Stage output type with factory methods.

use super::StageStatus;
use crate::errors::{DeployError, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The outcome of a stage execution: success, skipped or failed.
///
/// `StageOutput` is immutable once created. Successful stages may hand
/// facts to later stages through `data` (for example the resolved
/// registry account).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutput {
    /// The status of the stage execution.
    pub status: StageStatus,

    /// Facts produced by a successful stage.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, serde_json::Value>,

    /// Skip reason (for skipped executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,

    /// Error message (for failed executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error class (for failed executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl Default for StageOutput {
    fn default() -> Self {
        Self::ok_empty()
    }
}

impl StageOutput {
    /// Creates a successful output with data.
    #[must_use]
    pub fn ok(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            status: StageStatus::Ok,
            data,
            skip_reason: None,
            error: None,
            error_kind: None,
        }
    }

    /// Creates a successful output with no data.
    #[must_use]
    pub fn ok_empty() -> Self {
        Self::ok(HashMap::new())
    }

    /// Creates a successful output with a single value.
    #[must_use]
    pub fn ok_value(key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut data = HashMap::new();
        data.insert(key.into(), value);
        Self::ok(data)
    }

    /// Creates a skip output with a reason.
    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Skip,
            data: HashMap::new(),
            skip_reason: Some(reason.into()),
            error: None,
            error_kind: None,
        }
    }

    /// Creates a failure output.
    #[must_use]
    pub fn fail(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Fail,
            data: HashMap::new(),
            skip_reason: None,
            error: Some(error.into()),
            error_kind: Some(kind),
        }
    }

    /// Creates a failure output from a stage error.
    #[must_use]
    pub fn from_error(err: &DeployError) -> Self {
        Self::fail(err.kind(), err.to_string())
    }

    /// Returns true if the output lets the run continue.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the output indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Gets a value from the data.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Gets a string value from the data.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(serde_json::Value::as_str)
    }
}
