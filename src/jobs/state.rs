//! Generation job state machine.
//!
//! A job moves strictly forward:
//!
//! ```text
//! input_validation → generation → conflict_check → success
//!        │               │               │
//!        └───────────────┴───────────────┴──────→ failed
//! ```
//!
//! `generation → generation` is allowed for progress updates. Each
//! [`JobState`] variant carries only the data valid in that step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::GenerationRequest;
use crate::conflicts::{ConflictKind, ConflictReport};
use crate::models::Schedule;
use crate::scheduler::{SearchOutcome, TimetableKpi};
use crate::validation::ValidationError;
use crate::{Error, Result};

/// Job lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStep {
    InputValidation,
    Generation,
    ConflictCheck,
    Success,
    Failed,
}

impl JobStep {
    /// Snake-case label, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStep::InputValidation => "input_validation",
            JobStep::Generation => "generation",
            JobStep::ConflictCheck => "conflict_check",
            JobStep::Success => "success",
            JobStep::Failed => "failed",
        }
    }

    /// Whether the step is final.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStep::Success | JobStep::Failed)
    }

    /// Whether a cancel request is accepted in this step.
    pub fn is_cancellable(self) -> bool {
        matches!(self, JobStep::InputValidation | JobStep::Generation)
    }

    /// Whether moving to `next` is a valid transition.
    pub fn can_transition_to(self, next: JobStep) -> bool {
        use JobStep::*;

        matches!(
            (self, next),
            (InputValidation, Generation | Failed)
                | (Generation, Generation | ConflictCheck | Failed)
                | (ConflictCheck, Success | Failed)
        )
    }
}

impl fmt::Display for JobStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    /// Input failed validation.
    Validation,
    /// Search ended without placing every session.
    Infeasible,
    /// The search result broke a hard rule.
    ConstraintViolation,
    /// Cancelled on request.
    Canceled,
    /// The time budget ran out before every session was placed.
    Timeout,
    /// The worker failed unexpectedly.
    Internal,
}

impl JobErrorKind {
    /// Snake-case label, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            JobErrorKind::Validation => "validation",
            JobErrorKind::Infeasible => "infeasible",
            JobErrorKind::ConstraintViolation => "constraint_violation",
            JobErrorKind::Canceled => "canceled",
            JobErrorKind::Timeout => "timeout",
            JobErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct JobError {
    pub kind: JobErrorKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Aggregates validation errors into one failure.
    pub fn validation(errors: &[ValidationError]) -> Self {
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Self::new(JobErrorKind::Validation, message)
    }

    pub fn canceled() -> Self {
        Self::new(JobErrorKind::Canceled, "Generation was canceled")
    }
}

/// Output of a search run, kept on success (and as the partial result on failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub schedule: Schedule,
    pub kpi: TimetableKpi,
    pub outcome: SearchOutcome,
    pub backtracks: u64,
    pub penalty: f64,
}

/// Step-specific job state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum JobState {
    InputValidation,
    Generation {
        progress: u8,
    },
    ConflictCheck,
    Success {
        result: GenerationResult,
    },
    Failed {
        error: JobError,
        /// Progress reached before failing.
        progress: u8,
        #[serde(default)]
        conflicts: Vec<ConflictReport>,
        #[serde(default)]
        partial: Option<GenerationResult>,
    },
}

impl JobState {
    /// Failure without conflicts or partial result.
    pub fn failed(error: JobError, progress: u8) -> Self {
        JobState::Failed {
            error,
            progress,
            conflicts: Vec::new(),
            partial: None,
        }
    }

    pub fn step(&self) -> JobStep {
        match self {
            JobState::InputValidation => JobStep::InputValidation,
            JobState::Generation { .. } => JobStep::Generation,
            JobState::ConflictCheck => JobStep::ConflictCheck,
            JobState::Success { .. } => JobStep::Success,
            JobState::Failed { .. } => JobStep::Failed,
        }
    }

    /// Progress percentage in `0..=100`.
    pub fn progress(&self) -> u8 {
        match self {
            JobState::InputValidation => 0,
            JobState::Generation { progress } | JobState::Failed { progress, .. } => *progress,
            JobState::ConflictCheck | JobState::Success { .. } => 100,
        }
    }

    pub fn conflicts(&self) -> &[ConflictReport] {
        match self {
            JobState::Failed { conflicts, .. } => conflicts,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        match self {
            JobState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Final schedule of a successful job.
    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            JobState::Success { result } => Some(&result.schedule),
            _ => None,
        }
    }
}

/// Immutable view of a job at one point in time.
///
/// Snapshots are replaced wholesale on every update, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: Uuid,
    pub request: GenerationRequest,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobSnapshot {
    /// Snapshot of a freshly created job.
    pub fn new(job_id: Uuid, request: GenerationRequest) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            request,
            state: JobState::InputValidation,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn step(&self) -> JobStep {
        self.state.step()
    }

    pub fn is_terminal(&self) -> bool {
        self.step().is_terminal()
    }

    /// Successor snapshot in state `next`.
    ///
    /// # Errors
    /// [`Error::InvalidTransition`] for backward moves, moves out of a
    /// terminal step, and progress that would decrease.
    pub fn advance(&self, next: JobState) -> Result<Self> {
        let (from, to) = (self.step(), next.step());
        let regress = from == JobStep::Generation && to == JobStep::Generation && next.progress() < self.state.progress();
        if !from.can_transition_to(to) || regress {
            return Err(Error::InvalidTransition {
                from: from.as_str(),
                to: to.as_str(),
            });
        }
        Ok(Self {
            job_id: self.job_id,
            request: self.request.clone(),
            state: next,
            created_at: self.created_at,
            updated_at: Utc::now(),
        })
    }
}

/// One conflict in the status contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConflict {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub message: String,
    pub suggested_fix: Option<String>,
}

/// Poll response: `{jobId, step, progress, conflicts, resultUrl, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatus {
    pub job_id: Uuid,
    pub step: JobStep,
    pub progress: u8,
    pub conflicts: Vec<StatusConflict>,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

impl GenerationStatus {
    /// Builds the status of a snapshot. `resultUrl` is `{prefix}/{jobId}` on success.
    pub fn from_snapshot(snapshot: &JobSnapshot, result_url_prefix: &str) -> Self {
        let state = &snapshot.state;
        Self {
            job_id: snapshot.job_id,
            step: state.step(),
            progress: state.progress(),
            conflicts: state
                .conflicts()
                .iter()
                .map(|c| StatusConflict {
                    id: c.id.clone(),
                    kind: c.kind,
                    message: c.message.clone(),
                    suggested_fix: c.suggested_fix.clone(),
                })
                .collect(),
            result_url: matches!(state, JobState::Success { .. })
                .then(|| format!("{}/{}", result_url_prefix.trim_end_matches('/'), snapshot.job_id)),
            error: state.error().map(|e| e.message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflicts::Severity;

    fn snapshot() -> JobSnapshot {
        JobSnapshot::new(Uuid::nil(), GenerationRequest::new("D1", "3"))
    }

    fn sample_result() -> GenerationResult {
        let problem = crate::testing::two_subject_problem();
        let schedule = Schedule::new();
        GenerationResult {
            kpi: TimetableKpi::calculate(&problem, &schedule, &crate::constraints::ConstraintCatalog::new()),
            schedule,
            outcome: SearchOutcome::Complete,
            backtracks: 0,
            penalty: 0.0,
        }
    }

    #[test]
    fn test_initial_state() {
        let s = snapshot();
        assert_eq!(s.step(), JobStep::InputValidation);
        assert_eq!(s.state.progress(), 0);
        assert!(!s.is_terminal());
    }

    #[test]
    fn test_forward_transitions() {
        let s = snapshot();
        let s = s.advance(JobState::Generation { progress: 0 }).unwrap();
        let s = s.advance(JobState::Generation { progress: 40 }).unwrap();
        let s = s.advance(JobState::ConflictCheck).unwrap();
        let s = s
            .advance(JobState::Success {
                result: sample_result(),
            })
            .unwrap();
        assert!(s.is_terminal());
        assert!(s.updated_at >= s.created_at);
        assert!(s.state.schedule().is_some());
    }

    #[test]
    fn test_invalid_transitions() {
        let s = snapshot();
        assert!(s.advance(JobState::ConflictCheck).is_err());
        assert!(s.advance(JobState::InputValidation).is_err());

        let generating = s.advance(JobState::Generation { progress: 50 }).unwrap();
        assert!(generating.advance(JobState::InputValidation).is_err());
        assert!(generating.advance(JobState::Generation { progress: 10 }).is_err());

        let failed = generating
            .advance(JobState::failed(JobError::canceled(), 50))
            .unwrap();
        let err = failed.advance(JobState::Generation { progress: 60 }).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: "failed",
                to: "generation"
            }
        ));
    }

    #[test]
    fn test_cancellable_steps() {
        assert!(JobStep::InputValidation.is_cancellable());
        assert!(JobStep::Generation.is_cancellable());
        assert!(!JobStep::ConflictCheck.is_cancellable());
        assert!(!JobStep::Success.is_cancellable());
        assert!(!JobStep::Failed.is_cancellable());
    }

    #[test]
    fn test_state_serializes_with_step_tag() {
        let json = serde_json::to_value(JobState::Generation { progress: 42 }).unwrap();
        assert_eq!(json["step"], "generation");
        assert_eq!(json["progress"], 42);

        let json = serde_json::to_value(JobState::failed(JobError::canceled(), 10)).unwrap();
        assert_eq!(json["step"], "failed");
        assert_eq!(json["error"]["kind"], "canceled");
    }

    #[test]
    fn test_status_of_success() {
        let s = snapshot()
            .advance(JobState::Generation { progress: 100 })
            .unwrap()
            .advance(JobState::ConflictCheck)
            .unwrap()
            .advance(JobState::Success {
                result: sample_result(),
            })
            .unwrap();

        let status = GenerationStatus::from_snapshot(&s, "/timetable/results/");
        assert_eq!(status.step, JobStep::Success);
        assert_eq!(status.progress, 100);
        assert_eq!(
            status.result_url.as_deref(),
            Some("/timetable/results/00000000-0000-0000-0000-000000000000")
        );
        assert!(status.error.is_none());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["jobId"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["step"], "success");
        assert!(json["resultUrl"].is_string());
    }

    #[test]
    fn test_status_of_failure_carries_conflicts() {
        let conflict = ConflictReport {
            id: "unmet_requirement-1".into(),
            kind: ConflictKind::UnmetRequirement,
            severity: Severity::Medium,
            slots: vec![],
            entities: vec!["A:S1:theory".into()],
            message: "A:S1:theory has 0 of 3 weekly theory sessions".into(),
            suggested_fix: None,
        };
        let s = snapshot()
            .advance(JobState::Generation { progress: 0 })
            .unwrap()
            .advance(JobState::ConflictCheck)
            .unwrap()
            .advance(JobState::Failed {
                error: JobError::new(JobErrorKind::Infeasible, "1 requirement unmet"),
                progress: 100,
                conflicts: vec![conflict],
                partial: None,
            })
            .unwrap();

        let status = GenerationStatus::from_snapshot(&s, "/r");
        assert_eq!(status.step, JobStep::Failed);
        assert_eq!(status.error.as_deref(), Some("1 requirement unmet"));
        assert!(status.result_url.is_none());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["conflicts"][0]["type"], "unmet_requirement");
        assert_eq!(json["conflicts"][0]["suggestedFix"], serde_json::Value::Null);
    }
}
