//! Tests for StageOutput.

#[cfg(test)]
mod tests {
    use crate::core::{StageOutput, StageStatus};
    use crate::errors::{DeployError, ErrorKind, PrerequisiteError, StageExecutionError};

    #[test]
    fn test_output_ok_empty() {
        let output = StageOutput::ok_empty();
        assert!(output.is_success());
        assert!(!output.is_failure());
        assert_eq!(output.status, StageStatus::Ok);
        assert!(output.data.is_empty());
    }

    #[test]
    fn test_output_ok_value() {
        let output = StageOutput::ok_value("aws_account_id", serde_json::json!("123456789012"));
        assert!(output.is_success());
        assert_eq!(output.get_str("aws_account_id"), Some("123456789012"));
        assert_eq!(output.get_str("missing"), None);
    }

    #[test]
    fn test_output_skip() {
        let output = StageOutput::skip("No tests found");
        assert_eq!(output.status, StageStatus::Skip);
        // A skipped stage does not stop the run.
        assert!(output.is_success());
        assert_eq!(output.skip_reason.as_deref(), Some("No tests found"));
    }

    #[test]
    fn test_output_fail() {
        let output = StageOutput::fail(ErrorKind::StageExecution, "Tests failed");
        assert!(output.is_failure());
        assert!(!output.is_success());
        assert_eq!(output.error.as_deref(), Some("Tests failed"));
        assert_eq!(output.error_kind, Some(ErrorKind::StageExecution));
    }

    #[test]
    fn test_output_from_error() {
        let err: DeployError = PrerequisiteError::InvalidCredentials.into();
        let output = StageOutput::from_error(&err);
        assert_eq!(output.status, StageStatus::Fail);
        assert_eq!(output.error_kind, Some(ErrorKind::Prerequisite));
        assert_eq!(output.error.as_deref(), Some("AWS credentials not configured"));

        let err: DeployError = StageExecutionError::new("Docker push", 1).into();
        let output = StageOutput::from_error(&err);
        assert_eq!(output.error_kind, Some(ErrorKind::StageExecution));
    }

    #[test]
    fn test_output_serialization_omits_empty_fields() {
        let json = serde_json::to_value(StageOutput::ok_empty()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "ok"}));

        let json = serde_json::to_value(StageOutput::skip("nothing to do")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "skip", "skip_reason": "nothing to do"})
        );
    }
}
