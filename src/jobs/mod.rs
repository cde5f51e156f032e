//! Generation jobs: requests, the job state machine and the coordinator
//! that runs searches on worker threads.
//!
//! - [`GenerationRequest`]: program, semester, section selection, weight overrides
//! - [`JobState`] / [`JobSnapshot`]: forward-only lifecycle with immutable snapshots
//! - [`JobCoordinator`]: submit, poll, cancel, wait

mod coordinator;
mod request;
mod state;

pub use coordinator::JobCoordinator;
pub use request::GenerationRequest;
pub use state::{
    GenerationResult, GenerationStatus, JobError, JobErrorKind, JobSnapshot, JobState, JobStep,
    StatusConflict,
};
