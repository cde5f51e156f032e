//! Timetable search and KPI evaluation.
//!
//! # Algorithm
//!
//! `SearchEngine` runs a most-constrained-first backtracking search with
//! forward checking over (slot, room, faculty) candidates, ranking each
//! choice point by weighted soft penalty. It exits best-effort on a
//! backtrack bound or deadline and aborts on cancellation.
//!
//! # KPI
//!
//! `TimetableKpi` computes coverage, faculty load, room utilization, idle
//! periods and soft penalty.
//!
//! # References
//!
//! - Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//!   Constraint Satisfaction Problems"
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod kpi;
mod search;

pub use kpi::{FacultyLoad, TimetableKpi};
pub use search::{
    Cancelled, SearchControl, SearchEngine, SearchOutcome, SearchProgress, SearchReport,
    UnmetRequirement,
};
