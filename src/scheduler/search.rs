//! Backtracking search with forward checking.
//!
//! # Algorithm
//!
//! 1. **Domains**: for each requirement, enumerate every (slot, room, faculty)
//!    triple admitted by the static hard rules. Candidates are kept in
//!    canonical order (slot, room id, faculty id).
//! 2. **Selection**: pick the unfinished requirement with the fewest live
//!    candidates (most-constrained first); ties go to the earlier requirement.
//! 3. **Ranking**: order the live candidates by weighted soft penalty,
//!    ascending. Equal penalties keep canonical order.
//! 4. **Forward check**: after a tentative placement, every unfinished
//!    requirement must still see at least as many distinct live slots as it
//!    has sessions left. Otherwise the placement is retracted and the next
//!    candidate is tried.
//! 5. **Backtrack**: when a choice point runs out of candidates it is
//!    discarded and the previous one moves to its next alternative.
//!
//! Occurrences of one requirement are interchangeable, so they are placed in
//! strictly increasing slot order.
//!
//! The choice points live on an explicit stack. Cancellation, the deadline
//! and the backtrack bound are checked on every step; on the latter two the
//! best partial schedule seen so far (most placements, then lowest penalty)
//! is returned. A placement that fails the forward check still satisfies
//! every hard rule, so it counts as a partial result.
//!
//! # Complexity
//! Exponential in the worst case; bounded by `max_backtracks` and the deadline.
//!
//! # Reference
//! Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//! Constraint Satisfaction Problems"

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::constraints::{ConstraintCatalog, ConstraintWeights};
use crate::models::{
    Assignment, AssignmentRequirement, Placement, Schedule, Section, Subject, TimeSlot,
    TimetableProblem,
};

/// Limits and signals for one search run.
#[derive(Debug, Clone)]
pub struct SearchControl {
    /// Backtracks allowed before exiting best-effort.
    pub max_backtracks: u64,
    /// Wall-clock deadline.
    pub deadline: Option<Instant>,
    /// Cooperative cancellation flag.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SearchControl {
    /// Creates a control with a backtrack bound, no deadline and no cancel flag.
    pub fn new(max_backtracks: u64) -> Self {
        Self {
            max_backtracks,
            deadline: None,
            cancel: None,
        }
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to now.
    pub fn with_time_budget(self, budget: Duration) -> Self {
        self.with_deadline(Instant::now() + budget)
    }

    /// Sets the cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|f| f.load(Ordering::Acquire))
    }

    fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for SearchControl {
    fn default() -> Self {
        Self::new(200_000)
    }
}

/// How a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Every placeable session was placed.
    Complete,
    /// The search space was exhausted.
    Infeasible,
    /// The backtrack bound was reached.
    BacktrackLimit,
    /// The deadline passed.
    TimedOut,
}

impl SearchOutcome {
    /// Snake-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchOutcome::Complete => "complete",
            SearchOutcome::Infeasible => "infeasible",
            SearchOutcome::BacktrackLimit => "backtrack_limit",
            SearchOutcome::TimedOut => "timed_out",
        }
    }
}

/// A requirement left short of its weekly occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetRequirement {
    pub requirement_id: String,
    pub required: u32,
    pub placed: u32,
}

/// Result of a search run that was not cancelled.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Complete schedule, or the best partial one.
    pub schedule: Schedule,
    pub outcome: SearchOutcome,
    /// Sessions placed in `schedule`.
    pub placed: usize,
    /// Sessions demanded by all requirements.
    pub required: usize,
    /// Weighted soft penalty of `schedule`.
    pub penalty: f64,
    pub backtracks: u64,
    /// Requirements short of their occurrences, in requirement order.
    pub unmet: Vec<UnmetRequirement>,
    pub elapsed: Duration,
}

impl SearchReport {
    /// Whether every requirement is fully met.
    pub fn is_complete(&self) -> bool {
        self.unmet.is_empty()
    }

    /// Fraction of demanded sessions placed (1.0 when nothing is demanded).
    pub fn coverage(&self) -> f64 {
        if self.required == 0 {
            1.0
        } else {
            self.placed as f64 / self.required as f64
        }
    }
}

/// Progress of a running search: best coverage so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProgress {
    pub placed: usize,
    pub total: usize,
    pub backtracks: u64,
}

impl SearchProgress {
    /// Percentage in `0..=100`.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            100
        } else {
            ((self.placed.min(self.total) * 100) / self.total) as u8
        }
    }
}

/// The run was cancelled through its flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("search canceled after {backtracks} backtracks")]
pub struct Cancelled {
    pub backtracks: u64,
}

/// Backtracking timetable solver.
///
/// # Example
/// ```
/// use u_timetable::models::*;
/// use u_timetable::scheduler::{SearchControl, SearchEngine};
///
/// let problem = TimetableProblem::new(
///     WeekGrid::weekdays(6),
///     vec![Room::lecture("R1", 60)],
///     vec![Faculty::new("F1", "D1").with_subject("S1")],
///     vec![Section::new("A", "D1", "3", 60).with_subject("S1")],
///     vec![Subject::new("S1", "CS201").with_hours(3, 0)],
/// );
///
/// let report = SearchEngine::default()
///     .solve(&problem, &SearchControl::default())
///     .unwrap();
/// assert!(report.is_complete());
/// assert_eq!(report.schedule.assignment_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SearchEngine {
    catalog: ConstraintCatalog,
}

impl SearchEngine {
    /// Creates an engine over a constraint catalog.
    pub fn new(catalog: ConstraintCatalog) -> Self {
        Self { catalog }
    }

    /// Creates an engine over the standard catalog with the given weights.
    pub fn with_weights(weights: &ConstraintWeights) -> Self {
        Self::new(ConstraintCatalog::standard(weights))
    }

    /// The catalog the engine places against.
    pub fn catalog(&self) -> &ConstraintCatalog {
        &self.catalog
    }

    /// Runs the search without progress reporting.
    pub fn solve(&self, problem: &TimetableProblem, control: &SearchControl) -> Result<SearchReport, Cancelled> {
        self.solve_with_progress(problem, control, |_| {})
    }

    /// Runs the search, calling `on_progress` whenever best coverage grows.
    ///
    /// # Errors
    /// [`Cancelled`] if the control's cancel flag is raised during the run.
    #[tracing::instrument(skip_all, fields(requirements = problem.requirements.len()))]
    pub fn solve_with_progress<F>(
        &self,
        problem: &TimetableProblem,
        control: &SearchControl,
        mut on_progress: F,
    ) -> Result<SearchReport, Cancelled>
    where
        F: FnMut(SearchProgress),
    {
        let started = Instant::now();
        let mut state = SearchState::new(problem, &self.catalog);
        let target = state.total_target();
        let required = problem.total_sessions();
        debug!(target, required, "search started");

        let mut best = Best::default();
        let mut stack: Vec<Frame> = Vec::new();
        let mut backtracks: u64 = 0;
        let mut descend = true;

        let outcome = loop {
            if control.is_cancelled() {
                debug!(backtracks, placed = best.placed, "search cancelled");
                return Err(Cancelled { backtracks });
            }
            if control.is_expired() {
                break SearchOutcome::TimedOut;
            }

            if descend {
                match state.select() {
                    None => break SearchOutcome::Complete,
                    Some((req, live)) => {
                        let ranked = state.rank(req, live);
                        stack.push(Frame {
                            req,
                            ranked,
                            next: 0,
                            committed: None,
                        });
                    }
                }
            }

            let Some(frame) = stack.last_mut() else {
                break SearchOutcome::Infeasible;
            };

            if let Some(penalty) = frame.committed {
                if backtracks >= control.max_backtracks {
                    break SearchOutcome::BacktrackLimit;
                }
                frame.committed = None;
                state.retract(frame.req, penalty);
                backtracks += 1;
            }

            while frame.next < frame.ranked.len() {
                let (candidate, penalty) = frame.ranked[frame.next];
                frame.next += 1;
                state.commit(frame.req, candidate, penalty);
                if state.improves(&best) {
                    let grew = state.placed_total > best.placed;
                    best = state.snapshot();
                    if grew {
                        on_progress(SearchProgress {
                            placed: best.placed,
                            total: required,
                            backtracks,
                        });
                    }
                }
                if state.forward_check() {
                    frame.committed = Some(penalty);
                    break;
                }
                state.retract(frame.req, penalty);
            }

            if frame.committed.is_some() {
                descend = true;
            } else {
                stack.pop();
                descend = false;
            }
        };

        let schedule: Schedule = best.assignments.into_iter().collect();
        let unmet = problem
            .requirements
            .iter()
            .filter_map(|r| {
                let placed = schedule.placed_count(&r.id);
                (placed < r.occurrences).then(|| UnmetRequirement {
                    requirement_id: r.id.clone(),
                    required: r.occurrences,
                    placed,
                })
            })
            .collect::<Vec<_>>();

        let elapsed = started.elapsed();
        if outcome == SearchOutcome::Complete {
            debug!(outcome = outcome.as_str(), placed = best.placed, total = required, backtracks, "search finished");
        } else {
            warn!(
                outcome = outcome.as_str(),
                placed = best.placed,
                total = required,
                backtracks,
                elapsed_ms = elapsed.as_millis() as u64,
                "search exited best-effort"
            );
        }

        Ok(SearchReport {
            placed: best.placed,
            schedule,
            outcome,
            required,
            penalty: best.penalty,
            backtracks,
            unmet,
            elapsed,
        })
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::with_weights(&ConstraintWeights::default())
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    slot: TimeSlot,
    room: usize,
    faculty: usize,
}

/// One resolvable requirement and its static domain.
struct RequirementView<'a> {
    requirement: &'a AssignmentRequirement,
    section: &'a Section,
    subject: &'a Subject,
    /// Sorted by (slot, room, faculty).
    domain: Vec<Candidate>,
    target: u32,
}

struct Frame {
    req: usize,
    ranked: Vec<(Candidate, f64)>,
    next: usize,
    /// Penalty of the committed candidate, if any.
    committed: Option<f64>,
}

#[derive(Default)]
struct Best {
    placed: usize,
    penalty: f64,
    assignments: Vec<Assignment>,
}

struct SearchState<'a> {
    problem: &'a TimetableProblem,
    catalog: &'a ConstraintCatalog,
    views: Vec<RequirementView<'a>>,
    schedule: Schedule,
    placed: Vec<u32>,
    last_slots: Vec<Vec<TimeSlot>>,
    placed_total: usize,
    penalty: f64,
}

impl<'a> SearchState<'a> {
    fn new(problem: &'a TimetableProblem, catalog: &'a ConstraintCatalog) -> Self {
        let slots = problem.grid.teaching_slots();
        let empty = Schedule::new();
        let mut views = Vec::with_capacity(problem.requirements.len());

        for requirement in &problem.requirements {
            let (Some(section), Some(subject)) = (
                problem.section(&requirement.section_id),
                problem.subject(&requirement.subject_id),
            ) else {
                warn!(requirement = %requirement.id, "requirement references unknown section or subject");
                continue;
            };

            let mut domain = Vec::new();
            for &slot in &slots {
                for (ri, room) in problem.rooms.iter().enumerate() {
                    for (fi, faculty) in problem.faculty.iter().enumerate() {
                        let placement = Placement {
                            requirement,
                            section,
                            subject,
                            room,
                            faculty,
                            slot,
                        };
                        if catalog.admits_static(problem, &empty, &placement) {
                            domain.push(Candidate {
                                slot,
                                room: ri,
                                faculty: fi,
                            });
                        }
                    }
                }
            }

            let distinct_slots = count_distinct_slots(&domain);
            let target = requirement.occurrences.min(distinct_slots as u32);
            if target < requirement.occurrences {
                warn!(
                    requirement = %requirement.id,
                    required = requirement.occurrences,
                    admissible_slots = distinct_slots,
                    "requirement cannot be fully placed"
                );
            }

            views.push(RequirementView {
                requirement,
                section,
                subject,
                domain,
                target,
            });
        }

        let n = views.len();
        Self {
            problem,
            catalog,
            views,
            schedule: Schedule::new(),
            placed: vec![0; n],
            last_slots: vec![Vec::new(); n],
            placed_total: 0,
            penalty: 0.0,
        }
    }

    fn total_target(&self) -> usize {
        self.views.iter().map(|v| v.target as usize).sum()
    }

    fn remaining(&self, i: usize) -> u32 {
        self.views[i].target - self.placed[i]
    }

    fn placement(&self, i: usize, c: Candidate) -> Placement<'a> {
        let view = &self.views[i];
        Placement {
            requirement: view.requirement,
            section: view.section,
            subject: view.subject,
            room: &self.problem.rooms[c.room],
            faculty: &self.problem.faculty[c.faculty],
            slot: c.slot,
        }
    }

    /// Domain suffix after the requirement's last placed slot.
    fn open_domain(&self, i: usize) -> &[Candidate] {
        let domain = &self.views[i].domain;
        match self.last_slots[i].last() {
            Some(&last) => &domain[domain.partition_point(|c| c.slot <= last)..],
            None => domain,
        }
    }

    fn is_live(&self, i: usize, c: Candidate) -> bool {
        self.catalog
            .admits_dynamic(self.problem, &self.schedule, &self.placement(i, c))
    }

    /// Most-constrained unfinished requirement with its live candidates.
    fn select(&self) -> Option<(usize, Vec<Candidate>)> {
        let mut best: Option<(usize, Vec<Candidate>)> = None;
        for i in 0..self.views.len() {
            if self.remaining(i) == 0 {
                continue;
            }
            let live: Vec<Candidate> = self
                .open_domain(i)
                .iter()
                .copied()
                .filter(|&c| self.is_live(i, c))
                .collect();
            let fewer = best.as_ref().map_or(true, |(_, b)| live.len() < b.len());
            if fewer {
                let empty = live.is_empty();
                best = Some((i, live));
                if empty {
                    break;
                }
            }
        }
        best
    }

    fn rank(&self, i: usize, live: Vec<Candidate>) -> Vec<(Candidate, f64)> {
        let mut ranked: Vec<(Candidate, f64)> = live
            .into_iter()
            .map(|c| {
                let penalty = self.catalog.penalty(self.problem, &self.schedule, &self.placement(i, c));
                (c, penalty)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }

    fn commit(&mut self, i: usize, c: Candidate, penalty: f64) {
        let assignment = self.placement(i, c).to_assignment();
        self.schedule.add_assignment(assignment);
        self.placed[i] += 1;
        self.last_slots[i].push(c.slot);
        self.placed_total += 1;
        self.penalty += penalty;
    }

    fn retract(&mut self, i: usize, penalty: f64) {
        self.schedule.pop();
        self.placed[i] -= 1;
        self.last_slots[i].pop();
        self.placed_total -= 1;
        self.penalty -= penalty;
    }

    /// Every unfinished requirement still has enough distinct live slots.
    fn forward_check(&self) -> bool {
        (0..self.views.len()).all(|i| {
            let need = self.remaining(i) as usize;
            need == 0 || self.live_slots_at_least(i, need)
        })
    }

    fn live_slots_at_least(&self, i: usize, need: usize) -> bool {
        let mut found = 0;
        let mut counted: Option<TimeSlot> = None;
        for &c in self.open_domain(i) {
            if counted == Some(c.slot) {
                continue;
            }
            if self.is_live(i, c) {
                counted = Some(c.slot);
                found += 1;
                if found >= need {
                    return true;
                }
            }
        }
        false
    }

    fn improves(&self, best: &Best) -> bool {
        self.placed_total > best.placed
            || (self.placed_total == best.placed && self.penalty < best.penalty - 1e-9)
    }

    fn snapshot(&self) -> Best {
        Best {
            placed: self.placed_total,
            penalty: self.penalty,
            assignments: self.schedule.assignments().to_vec(),
        }
    }
}

fn count_distinct_slots(domain: &[Candidate]) -> usize {
    let mut count = 0;
    let mut previous = None;
    for c in domain {
        if previous != Some(c.slot) {
            previous = Some(c.slot);
            count += 1;
        }
    }
    count
}
