//! Asynchronous generation jobs.
//!
//! Each submitted job runs on its own worker thread through
//! input_validation → generation → conflict_check and ends in success or
//! failed. The current state of a job is an immutable [`JobSnapshot`]
//! behind an `Arc`; the worker publishes a new snapshot on every change and
//! readers clone the `Arc`, so polling never blocks the search.
//!
//! Cancellation raises a flag the search checks on every step. A cancel is
//! accepted only in input_validation or generation. The flag is raised
//! under the snapshot lock and the worker checks it under the same lock
//! before every step change and before recording a validation failure, so an
//! accepted cancel always ends the job as failed/canceled.
//!
//! Terminal jobs stay queryable until removed with
//! [`JobCoordinator::remove`] or [`JobCoordinator::remove_finished`].

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::state::{GenerationResult, GenerationStatus, JobError, JobErrorKind, JobSnapshot, JobState};
use super::GenerationRequest;
use crate::config::EngineConfig;
use crate::conflicts::{has_hard_violations, ConflictDetector};
use crate::constraints::ConstraintCatalog;
use crate::models::{MasterData, TimetableProblem};
use crate::scheduler::{SearchControl, SearchEngine, SearchOutcome, SearchReport, TimetableKpi};
use crate::validation::build_problem;
use crate::{Error, Result};

/// Shared state of one job.
struct JobHandle {
    snapshot: RwLock<Arc<JobSnapshot>>,
    cancel: Arc<AtomicBool>,
    finished: Mutex<bool>,
    finished_cv: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobHandle {
    fn new(snapshot: JobSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            cancel: Arc::new(AtomicBool::new(false)),
            finished: Mutex::new(false),
            finished_cv: Condvar::new(),
            worker: Mutex::new(None),
        }
    }

    fn current(&self) -> Arc<JobSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Replaces the snapshot with the state `f` derives from the current one.
    /// `f` returning `None` leaves the snapshot untouched.
    fn update<F>(&self, f: F) -> Arc<JobSnapshot>
    where
        F: FnOnce(&JobSnapshot) -> Option<JobState>,
    {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let Some(next) = f(&guard) else {
            return Arc::clone(&guard);
        };

        match guard.advance(next) {
            Ok(snapshot) => {
                let step = snapshot.step();
                if step != guard.step() {
                    info!(job_id = %snapshot.job_id, step = step.as_str(), "job advanced");
                }
                *guard = Arc::new(snapshot);
                if step.is_terminal() {
                    drop(guard);
                    self.mark_finished();
                    return self.current();
                }
            }
            Err(e) => error!(job_id = %guard.job_id, error = %e, "rejected job transition"),
        }
        Arc::clone(&guard)
    }

    /// Moves to `next` unless a cancel was requested, in which case the job
    /// fails as canceled. Returns whether the job may continue.
    fn advance_unless_cancelled(&self, next: JobState) -> bool {
        let snapshot = self.update(|current| {
            if self.is_cancel_requested() {
                Some(JobState::failed(JobError::canceled(), current.state.progress()))
            } else {
                Some(next)
            }
        });
        !snapshot.is_terminal()
    }

    fn report_progress(&self, progress: u8) {
        self.update(|current| match current.state {
            JobState::Generation { progress: p } if progress > p => Some(JobState::Generation { progress }),
            _ => None,
        });
    }

    fn fail(&self, error: JobError) {
        self.update(|current| {
            (!current.is_terminal()).then(|| JobState::failed(error, current.state.progress()))
        });
    }

    /// Fails with `error`, or as canceled when a cancel was accepted first.
    fn fail_unless_cancelled(&self, error: JobError) {
        self.update(|current| {
            (!current.is_terminal()).then(|| {
                let error = if self.is_cancel_requested() { JobError::canceled() } else { error };
                JobState::failed(error, current.state.progress())
            })
        });
    }

    fn mark_finished(&self) {
        let mut finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        *finished = true;
        self.finished_cv.notify_all();
    }

    fn wait_finished(&self, timeout: Duration) {
        let finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        let _unused = self
            .finished_cv
            .wait_timeout_while(finished, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Runs and tracks generation jobs.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use u_timetable::jobs::{GenerationRequest, JobCoordinator, JobStep};
/// use u_timetable::models::*;
/// use u_timetable::EngineConfig;
///
/// let master = MasterData::new()
///     .with_department(Department::new("D1", "CSE", "Computer Science"))
///     .with_room(Room::lecture("R1", 60))
///     .with_faculty(Faculty::new("F1", "D1").with_subject("S1"))
///     .with_subject(Subject::new("S1", "CS201").with_hours(3, 0))
///     .with_section(Section::new("A", "D1", "3", 60).with_subject("S1"));
///
/// let coordinator = JobCoordinator::new(EngineConfig::default());
/// let id = coordinator.submit(GenerationRequest::new("CSE", "3"), Arc::new(master));
/// let snapshot = coordinator.wait(id, Duration::from_secs(10)).unwrap();
/// assert_eq!(snapshot.step(), JobStep::Success);
/// ```
pub struct JobCoordinator {
    config: Arc<EngineConfig>,
    jobs: RwLock<HashMap<Uuid, Arc<JobHandle>>>,
}

impl JobCoordinator {
    /// Creates a coordinator with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a coordinator configured from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(EngineConfig::from_env()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs input validation synchronously, without creating a job.
    ///
    /// # Errors
    /// [`Error::Validation`] with every problem found.
    pub fn preflight(&self, request: &GenerationRequest, master: &MasterData) -> Result<()> {
        build_problem(master, request, &self.config)
            .map(|_| ())
            .map_err(Error::Validation)
    }

    /// Creates a job and starts its worker. Returns the job id immediately.
    #[instrument(skip_all, fields(program = %request.program, semester = %request.semester))]
    pub fn submit(&self, request: GenerationRequest, master: Arc<MasterData>) -> Uuid {
        let job_id = Uuid::new_v4();
        let handle = Arc::new(JobHandle::new(JobSnapshot::new(job_id, request.clone())));
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id, Arc::clone(&handle));
        info!(job_id = %job_id, "job submitted");

        let worker_handle = Arc::clone(&handle);
        let config = Arc::clone(&self.config);
        let spawned = std::thread::Builder::new()
            .name(format!("timetable-{job_id}"))
            .spawn(move || run_worker(&worker_handle, &request, &master, &config));

        match spawned {
            Ok(join) => {
                *handle.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(join);
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "failed to spawn worker");
                handle.fail(JobError::new(JobErrorKind::Internal, format!("Failed to start worker: {e}")));
            }
        }
        job_id
    }

    /// Latest snapshot of a job.
    pub fn snapshot(&self, job_id: Uuid) -> Result<Arc<JobSnapshot>> {
        Ok(self.handle(job_id)?.current())
    }

    /// Poll response for a job.
    pub fn status(&self, job_id: Uuid) -> Result<GenerationStatus> {
        let snapshot = self.snapshot(job_id)?;
        Ok(GenerationStatus::from_snapshot(&snapshot, &self.config.result_url_prefix))
    }

    /// Requests cancellation.
    ///
    /// # Errors
    /// [`Error::JobNotFound`], or [`Error::CancelRejected`] once the job has
    /// reached conflict_check or a terminal step.
    #[instrument(skip(self))]
    pub fn cancel(&self, job_id: Uuid) -> Result<()> {
        let handle = self.handle(job_id)?;
        let guard = handle.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        let step = guard.step();
        if !step.is_cancellable() {
            warn!(job_id = %job_id, step = step.as_str(), "cancel rejected");
            return Err(Error::CancelRejected {
                job_id,
                step: step.as_str(),
            });
        }
        handle.cancel.store(true, Ordering::Release);
        info!(job_id = %job_id, step = step.as_str(), "cancel requested");
        Ok(())
    }

    /// Blocks until the job is terminal or `timeout` elapses, then returns
    /// the latest snapshot.
    pub fn wait(&self, job_id: Uuid, timeout: Duration) -> Result<Arc<JobSnapshot>> {
        let handle = self.handle(job_id)?;
        handle.wait_finished(timeout);
        Ok(handle.current())
    }

    /// Ids of every known job, sorted.
    pub fn job_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Forgets a terminal job, joining its worker, and returns its final snapshot.
    ///
    /// # Errors
    /// [`Error::JobNotFound`], or [`Error::JobActive`] while the job is still running.
    #[instrument(skip(self))]
    pub fn remove(&self, job_id: Uuid) -> Result<Arc<JobSnapshot>> {
        let handle = {
            let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
            let handle = jobs.get(&job_id).cloned().ok_or(Error::JobNotFound(job_id))?;
            let step = handle.current().step();
            if !step.is_terminal() {
                return Err(Error::JobActive {
                    job_id,
                    step: step.as_str(),
                });
            }
            jobs.remove(&job_id);
            handle
        };
        join_worker(&handle);
        info!(job_id = %job_id, "job removed");
        Ok(handle.current())
    }

    /// Forgets every terminal job. Returns how many were removed.
    pub fn remove_finished(&self) -> usize {
        let finished: Vec<Arc<JobHandle>> = {
            let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
            let ids: Vec<Uuid> = jobs
                .iter()
                .filter(|(_, handle)| handle.current().is_terminal())
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| jobs.remove(id)).collect()
        };
        for handle in &finished {
            join_worker(handle);
        }
        finished.len()
    }

    /// Cancels every cancellable job and joins all workers.
    pub fn shutdown(&self) {
        let handles: Vec<Arc<JobHandle>> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for handle in &handles {
            let guard = handle.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            if guard.step().is_cancellable() {
                handle.cancel.store(true, Ordering::Release);
            }
        }
        for handle in &handles {
            join_worker(handle);
        }
    }

    fn handle(&self, job_id: Uuid) -> Result<Arc<JobHandle>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_id)
            .cloned()
            .ok_or(Error::JobNotFound(job_id))
    }
}

impl std::fmt::Debug for JobCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCoordinator")
            .field("config", &self.config)
            .field("jobs", &self.job_ids().len())
            .finish()
    }
}

fn join_worker(handle: &JobHandle) {
    let worker = handle.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(worker) = worker {
        if worker.join().is_err() {
            warn!("worker thread panicked");
        }
    }
}

fn run_worker(handle: &JobHandle, request: &GenerationRequest, master: &MasterData, config: &EngineConfig) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_job(handle, request, master, config)));
    if let Err(payload) = outcome {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "worker panicked".to_string());
        let job_id = handle.current().job_id;
        error!(job_id = %job_id, panic = %message, "generation worker panicked");
        handle.fail(JobError::new(JobErrorKind::Internal, message));
    }
}

fn run_job(handle: &JobHandle, request: &GenerationRequest, master: &MasterData, config: &EngineConfig) {
    let started = Instant::now();
    let job_id = handle.current().job_id;

    let (problem, weights) = match build_problem(master, request, config) {
        Ok(built) => built,
        Err(errors) => {
            warn!(job_id = %job_id, errors = errors.len(), "input validation failed");
            handle.fail_unless_cancelled(JobError::validation(&errors));
            return;
        }
    };

    if !handle.advance_unless_cancelled(JobState::Generation { progress: 0 }) {
        return;
    }

    let engine = SearchEngine::with_weights(&weights);
    let control = SearchControl::new(config.max_backtracks)
        .with_deadline(started + config.time_budget)
        .with_cancel_flag(Arc::clone(&handle.cancel));
    let report = match engine.solve_with_progress(&problem, &control, |p| handle.report_progress(p.percent())) {
        Ok(report) => report,
        Err(cancelled) => {
            info!(job_id = %job_id, backtracks = cancelled.backtracks, "generation canceled");
            handle.fail(JobError::canceled());
            return;
        }
    };
    info!(
        job_id = %job_id,
        outcome = report.outcome.as_str(),
        placed = report.placed,
        total = report.required,
        backtracks = report.backtracks,
        "generation finished"
    );

    if !handle.advance_unless_cancelled(JobState::ConflictCheck) {
        return;
    }

    let next = conclude(job_id, &problem, engine.catalog(), report, config.time_budget);
    handle.update(|_| Some(next));
}

/// Terminal state for a finished search: success when the conflict check
/// comes back empty, otherwise a failure carrying the conflicts and the
/// partial result.
fn conclude(
    job_id: Uuid,
    problem: &TimetableProblem,
    catalog: &ConstraintCatalog,
    report: SearchReport,
    time_budget: Duration,
) -> JobState {
    let conflicts = ConflictDetector::new(catalog.clone()).detect(problem, &report.schedule);
    let result = GenerationResult {
        kpi: TimetableKpi::calculate(problem, &report.schedule, catalog),
        schedule: report.schedule,
        outcome: report.outcome,
        backtracks: report.backtracks,
        penalty: report.penalty,
    };

    if conflicts.is_empty() {
        return JobState::Success { result };
    }

    let error = if has_hard_violations(&conflicts) {
        error!(job_id = %job_id, conflicts = conflicts.len(), "search result violates hard constraints");
        JobError::new(
            JobErrorKind::ConstraintViolation,
            format!("Generated schedule has {} hard-constraint conflict(s)", conflicts.len()),
        )
    } else if report.outcome == SearchOutcome::TimedOut {
        JobError::new(
            JobErrorKind::Timeout,
            format!(
                "Time budget of {}s ran out with {} of {} sessions placed",
                time_budget.as_secs(),
                report.placed,
                report.required
            ),
        )
    } else {
        JobError::new(
            JobErrorKind::Infeasible,
            format!(
                "{} of {} sessions placed; {} requirement(s) unmet",
                report.placed,
                report.required,
                report.unmet.len()
            ),
        )
    };
    JobState::Failed {
        error,
        progress: 100,
        conflicts,
        partial: Some(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflicts::ConflictKind;
    use crate::constraints::ConstraintWeights;
    use crate::jobs::JobStep;
    use crate::models::{Day, Department, Faculty, Room, Schedule, Section, Subject};
    use crate::testing::{assignment, two_subject_problem};

    fn master(room_capacity: u32) -> MasterData {
        MasterData::new()
            .with_department(Department::new("D1", "CSE", "Computer Science"))
            .with_room(Room::lecture("R1", room_capacity))
            .with_room(Room::lecture("R2", room_capacity))
            .with_faculty(Faculty::new("F1", "D1").with_subject("S1").with_max_hours(10))
            .with_faculty(Faculty::new("F2", "D1").with_subject("S2").with_max_hours(10))
            .with_subject(Subject::new("S1", "CS201").with_hours(3, 0))
            .with_subject(Subject::new("S2", "CS202").with_hours(3, 0))
            .with_section(Section::new("A", "D1", "3", 60).with_subject("S1").with_subject("S2"))
    }

    const WAIT: Duration = Duration::from_secs(30);

    #[test]
    fn test_job_succeeds() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = coordinator.submit(GenerationRequest::new("D1", "3"), Arc::new(master(60)));

        let snapshot = coordinator.wait(id, WAIT).unwrap();
        assert_eq!(snapshot.step(), JobStep::Success);
        assert_eq!(snapshot.state.schedule().map(|s| s.assignment_count()), Some(6));

        let status = coordinator.status(id).unwrap();
        assert_eq!(status.progress, 100);
        assert_eq!(status.result_url, Some(format!("/timetable/results/{id}")));
        assert!(status.conflicts.is_empty());
    }

    #[test]
    fn test_validation_failure() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = coordinator.submit(GenerationRequest::new("XYZ", "3"), Arc::new(master(60)));

        let snapshot = coordinator.wait(id, WAIT).unwrap();
        let error = snapshot.state.error().unwrap();
        assert_eq!(error.kind, JobErrorKind::Validation);
        assert!(error.message.contains("XYZ"));
    }

    #[test]
    fn test_infeasible_capacity() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = coordinator.submit(GenerationRequest::new("D1", "3"), Arc::new(master(40)));

        let snapshot = coordinator.wait(id, WAIT).unwrap();
        assert_eq!(snapshot.step(), JobStep::Failed);
        assert_eq!(snapshot.state.error().map(|e| e.kind), Some(JobErrorKind::Infeasible));
        assert_eq!(snapshot.state.conflicts().len(), 2);
    }

    #[test]
    fn test_preflight() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        assert!(coordinator
            .preflight(&GenerationRequest::new("CSE", "3"), &master(60))
            .is_ok());
        let err = coordinator
            .preflight(&GenerationRequest::new("CSE", "3"), &MasterData::new())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(errors) if !errors.is_empty()));
    }

    #[test]
    fn test_unknown_job() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = Uuid::new_v4();
        assert!(matches!(coordinator.status(id), Err(Error::JobNotFound(x)) if x == id));
        assert!(matches!(coordinator.cancel(id), Err(Error::JobNotFound(_))));
    }

    #[test]
    fn test_cancel_rejected_after_terminal() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = coordinator.submit(GenerationRequest::new("D1", "3"), Arc::new(master(60)));
        coordinator.wait(id, WAIT).unwrap();

        let err = coordinator.cancel(id).unwrap_err();
        assert!(matches!(err, Error::CancelRejected { step: "success", .. }));
    }

    #[test]
    fn test_terminal_polls_are_identical() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = coordinator.submit(GenerationRequest::new("D1", "3"), Arc::new(master(60)));
        coordinator.wait(id, WAIT).unwrap();

        let a = coordinator.snapshot(id).unwrap();
        let b = coordinator.snapshot(id).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(coordinator.status(id).unwrap(), coordinator.status(id).unwrap());
    }

    #[test]
    fn test_shutdown_joins_workers() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = coordinator.submit(GenerationRequest::new("D1", "3"), Arc::new(master(60)));
        coordinator.shutdown();
        assert!(coordinator.snapshot(id).unwrap().is_terminal());
        assert_eq!(coordinator.job_ids(), vec![id]);
    }

    #[test]
    fn test_cancel_wins_over_validation_failure() {
        let request = GenerationRequest::new("XYZ", "3");
        let handle = JobHandle::new(JobSnapshot::new(Uuid::new_v4(), request.clone()));
        handle.cancel.store(true, Ordering::Release);

        run_job(&handle, &request, &master(60), &EngineConfig::default());

        let snapshot = handle.current();
        assert_eq!(snapshot.step(), JobStep::Failed);
        assert_eq!(snapshot.state.error().map(|e| e.kind), Some(JobErrorKind::Canceled));
    }

    fn report(schedule: Schedule, outcome: SearchOutcome, required: usize) -> SearchReport {
        SearchReport {
            placed: schedule.assignment_count(),
            schedule,
            outcome,
            required,
            penalty: 0.0,
            backtracks: 0,
            unmet: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_conclude_hard_violation() {
        let problem = two_subject_problem();
        let schedule: Schedule = [
            assignment(&problem, "A:S1:theory", Day::Monday, 0, "R1", "F1"),
            assignment(&problem, "A:S2:theory", Day::Monday, 0, "R1", "F2"),
        ]
        .into_iter()
        .collect();

        let state = conclude(
            Uuid::nil(),
            &problem,
            &ConstraintCatalog::standard(&ConstraintWeights::default()),
            report(schedule, SearchOutcome::Complete, 6),
            Duration::from_secs(60),
        );

        assert_eq!(state.error().map(|e| e.kind), Some(JobErrorKind::ConstraintViolation));
        let kinds: Vec<ConflictKind> = state.conflicts().iter().map(|c| c.kind).collect();
        assert!(kinds.contains(&ConflictKind::DoubleBookingRoom));
        assert!(kinds.contains(&ConflictKind::DoubleBookingSection));
        assert!(matches!(state, JobState::Failed { partial: Some(_), .. }));
    }

    #[test]
    fn test_conclude_timeout() {
        let problem = two_subject_problem();
        let state = conclude(
            Uuid::nil(),
            &problem,
            &ConstraintCatalog::standard(&ConstraintWeights::default()),
            report(Schedule::new(), SearchOutcome::TimedOut, 6),
            Duration::from_secs(5),
        );

        let error = state.error().unwrap();
        assert_eq!(error.kind, JobErrorKind::Timeout);
        assert!(error.message.contains("5s"));
        assert_eq!(state.conflicts().len(), 2);
        assert!(state.conflicts().iter().all(|c| c.kind == ConflictKind::UnmetRequirement));
    }

    #[test]
    fn test_zero_time_budget_times_out() {
        let config = EngineConfig::default().with_time_budget(Duration::ZERO);
        let coordinator = JobCoordinator::new(config);
        let id = coordinator.submit(GenerationRequest::new("D1", "3"), Arc::new(master(60)));

        let snapshot = coordinator.wait(id, WAIT).unwrap();
        assert_eq!(snapshot.state.error().map(|e| e.kind), Some(JobErrorKind::Timeout));
        assert!(!snapshot.state.conflicts().is_empty());
    }

    #[test]
    fn test_remove_terminal_job() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = coordinator.submit(GenerationRequest::new("D1", "3"), Arc::new(master(60)));
        coordinator.wait(id, WAIT).unwrap();

        let removed = coordinator.remove(id).unwrap();
        assert_eq!(removed.step(), JobStep::Success);
        assert!(matches!(coordinator.snapshot(id), Err(Error::JobNotFound(_))));
        assert!(coordinator.job_ids().is_empty());
    }

    #[test]
    fn test_remove_rejects_running_job() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let id = Uuid::new_v4();
        let snapshot = JobSnapshot::new(id, GenerationRequest::new("D1", "3"));
        coordinator
            .jobs
            .write()
            .unwrap()
            .insert(id, Arc::new(JobHandle::new(snapshot)));

        let err = coordinator.remove(id).unwrap_err();
        assert!(matches!(err, Error::JobActive { step: "input_validation", .. }));
        assert_eq!(coordinator.remove_finished(), 0);
        assert_eq!(coordinator.job_ids(), vec![id]);
    }

    #[test]
    fn test_remove_finished() {
        let coordinator = JobCoordinator::new(EngineConfig::default());
        let ok = coordinator.submit(GenerationRequest::new("D1", "3"), Arc::new(master(60)));
        let bad = coordinator.submit(GenerationRequest::new("XYZ", "3"), Arc::new(master(60)));
        coordinator.wait(ok, WAIT).unwrap();
        coordinator.wait(bad, WAIT).unwrap();

        assert_eq!(coordinator.remove_finished(), 2);
        assert!(coordinator.job_ids().is_empty());
    }
}
