//! Crate error types.

use uuid::Uuid;

use crate::validation::ValidationError;

/// Result type for coordinator and configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the engine.
///
/// Failures inside a generation job never use this type; they are recorded
/// in the job's terminal state and observed through polling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Cancellation rejected: job {job_id} is already in step '{step}'")]
    CancelRejected { job_id: Uuid, step: &'static str },

    #[error("Job {job_id} is still running (step '{step}')")]
    JobActive { job_id: Uuid, step: &'static str },

    #[error("Invalid job transition from '{from}' to '{to}'")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("Invalid input: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_validation_error_display_joins_messages() {
        let err = Error::Validation(vec![
            ValidationError::new(ValidationErrorKind::NoRooms, "no rooms"),
            ValidationError::new(ValidationErrorKind::NoFaculty, "no faculty"),
        ]);
        assert_eq!(err.to_string(), "Invalid input: no rooms; no faculty");
    }

    #[test]
    fn test_cancel_rejected_display() {
        let id = Uuid::nil();
        let err = Error::CancelRejected {
            job_id: id,
            step: "conflict_check",
        };
        assert!(err.to_string().contains("conflict_check"));
    }

    #[test]
    fn test_job_active_display() {
        let err = Error::JobActive {
            job_id: Uuid::nil(),
            step: "generation",
        };
        assert!(err.to_string().contains("still running"));
    }
}
