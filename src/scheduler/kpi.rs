//! Timetable quality metrics (KPIs).
//!
//! Computes coverage, workload and utilization indicators from a schedule
//! and the problem it was generated for. These back the faculty-workload
//! and room-utilization reports.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Coverage | Placed sessions / demanded sessions |
//! | Faculty load | Assigned periods / max weekly hours |
//! | Room utilization | Occupied slots / teaching slots per week |
//! | Idle periods | Non-break gaps between a section's sessions, summed over days |
//! | Soft penalty | Weighted soft cost, replayed in placement order |
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", §2.1

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constraints::soft::idle_periods;
use crate::constraints::ConstraintCatalog;
use crate::models::{Schedule, TimetableProblem};

/// Teaching load of one faculty member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyLoad {
    pub hours: u32,
    pub max_hours: u32,
    /// `hours / max_hours` (0.0 when the cap is zero).
    pub load_ratio: f64,
}

/// Timetable performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableKpi {
    /// Sessions placed.
    pub placed_sessions: usize,
    /// Sessions demanded by all requirements.
    pub required_sessions: usize,
    /// Fraction of demanded sessions placed (0.0..=1.0).
    pub coverage: f64,
    /// Per-faculty load, every faculty member included.
    pub faculty_load: BTreeMap<String, FacultyLoad>,
    /// Per-room utilization, every room included.
    pub room_utilization: BTreeMap<String, f64>,
    /// Mean room utilization.
    pub avg_room_utilization: f64,
    /// Idle periods per section.
    pub section_idle_periods: BTreeMap<String, usize>,
    /// Sum of `section_idle_periods`.
    pub total_idle_periods: usize,
    /// Weighted soft penalty under the given catalog.
    pub soft_penalty: f64,
}

impl TimetableKpi {
    /// Computes KPIs for a schedule.
    ///
    /// # Arguments
    /// * `problem` - The problem the schedule was generated for.
    /// * `schedule` - A complete or partial schedule.
    /// * `catalog` - Catalog whose soft rules price the schedule.
    pub fn calculate(problem: &TimetableProblem, schedule: &Schedule, catalog: &ConstraintCatalog) -> Self {
        let placed_sessions = schedule.assignment_count();
        let required_sessions = problem.total_sessions();
        let coverage = if required_sessions == 0 {
            1.0
        } else {
            (placed_sessions as f64 / required_sessions as f64).min(1.0)
        };

        let faculty_load = problem
            .faculty
            .iter()
            .map(|f| {
                let hours = schedule.faculty_hours(&f.id);
                let load_ratio = if f.max_weekly_hours == 0 {
                    0.0
                } else {
                    hours as f64 / f.max_weekly_hours as f64
                };
                (
                    f.id.clone(),
                    FacultyLoad {
                        hours,
                        max_hours: f.max_weekly_hours,
                        load_ratio,
                    },
                )
            })
            .collect();

        let teaching_slots = problem.grid.teaching_slot_count();
        let room_utilization: BTreeMap<String, f64> = problem
            .rooms
            .iter()
            .map(|r| (r.id.clone(), schedule.room_utilization(&r.id, teaching_slots).unwrap_or(0.0)))
            .collect();
        let avg_room_utilization = if room_utilization.is_empty() {
            0.0
        } else {
            room_utilization.values().sum::<f64>() / room_utilization.len() as f64
        };

        let section_idle_periods: BTreeMap<String, usize> = problem
            .sections
            .iter()
            .map(|s| {
                let idle = problem
                    .grid
                    .working_days
                    .iter()
                    .map(|&day| idle_periods(&problem.grid, &schedule.section_periods_on(&s.id, day)))
                    .sum();
                (s.id.clone(), idle)
            })
            .collect();
        let total_idle_periods = section_idle_periods.values().sum();

        Self {
            placed_sessions,
            required_sessions,
            coverage,
            faculty_load,
            room_utilization,
            avg_room_utilization,
            section_idle_periods,
            total_idle_periods,
            soft_penalty: replay_penalty(problem, schedule, catalog),
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_coverage: f64, max_idle_periods: usize) -> bool {
        self.coverage >= min_coverage && self.total_idle_periods <= max_idle_periods
    }

    /// Faculty members above their weekly cap.
    pub fn overloaded_faculty(&self) -> Vec<&str> {
        self.faculty_load
            .iter()
            .filter(|(_, load)| load.hours > load.max_hours)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Soft penalty accumulated by placing the assignments in their stored order.
fn replay_penalty(problem: &TimetableProblem, schedule: &Schedule, catalog: &ConstraintCatalog) -> f64 {
    let mut replay = Schedule::new();
    let mut total = 0.0;
    for assignment in schedule.assignments() {
        if let Some(placement) = problem.resolve(assignment) {
            total += catalog.penalty(problem, &replay, &placement);
        }
        replay.add_assignment(assignment.clone());
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{soft, ConstraintWeights};
    use crate::models::Day;
    use crate::scheduler::{SearchControl, SearchEngine};
    use crate::testing::{assignment, two_subject_problem};

    #[test]
    fn test_kpi_basic() {
        let problem = two_subject_problem();
        let mut schedule = Schedule::new();
        schedule.add_assignment(assignment(&problem, "A:S1:theory", Day::Monday, 0, "R1", "F1"));
        schedule.add_assignment(assignment(&problem, "A:S2:theory", Day::Monday, 3, "R2", "F2"));

        let catalog = ConstraintCatalog::new().with_soft(soft::IdleGaps, 1.0);
        let kpi = TimetableKpi::calculate(&problem, &schedule, &catalog);

        assert_eq!(kpi.placed_sessions, 2);
        assert_eq!(kpi.required_sessions, 6);
        assert!((kpi.coverage - 1.0 / 3.0).abs() < 1e-10);
        assert_eq!(kpi.faculty_load["F1"].hours, 1);
        assert!((kpi.faculty_load["F1"].load_ratio - 0.1).abs() < 1e-10);
        assert_eq!(kpi.section_idle_periods["A"], 2);
        assert_eq!(kpi.total_idle_periods, 2);
        assert!((kpi.soft_penalty - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_room_utilization() {
        let problem = two_subject_problem();
        let mut schedule = Schedule::new();
        for day in [Day::Monday, Day::Tuesday, Day::Wednesday] {
            schedule.add_assignment(assignment(&problem, "A:S1:theory", day, 0, "R1", "F1"));
        }

        let kpi = TimetableKpi::calculate(&problem, &schedule, &ConstraintCatalog::new());
        // 3 of 30 teaching slots
        assert!((kpi.room_utilization["R1"] - 0.1).abs() < 1e-10);
        assert_eq!(kpi.room_utilization["R2"], 0.0);
        assert_eq!(kpi.room_utilization["L1"], 0.0);
        assert!((kpi.avg_room_utilization - 0.1 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_matches_search_penalty() {
        let problem = two_subject_problem();
        let engine = SearchEngine::default();
        let report = engine.solve(&problem, &SearchControl::default()).unwrap();

        let kpi = TimetableKpi::calculate(&problem, &report.schedule, engine.catalog());
        assert!((kpi.soft_penalty - report.penalty).abs() < 1e-9);
        assert!((kpi.coverage - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty() {
        let problem = two_subject_problem();
        let kpi = TimetableKpi::calculate(
            &problem,
            &Schedule::new(),
            &ConstraintCatalog::standard(&ConstraintWeights::default()),
        );
        assert_eq!(kpi.placed_sessions, 0);
        assert_eq!(kpi.coverage, 0.0);
        assert_eq!(kpi.total_idle_periods, 0);
        assert_eq!(kpi.soft_penalty, 0.0);
        assert!(kpi.overloaded_faculty().is_empty());
    }

    #[test]
    fn test_meets_thresholds() {
        let problem = two_subject_problem();
        let report = SearchEngine::default()
            .solve(&problem, &SearchControl::default())
            .unwrap();
        let kpi = TimetableKpi::calculate(&problem, &report.schedule, &ConstraintCatalog::new());

        assert!(kpi.meets_thresholds(1.0, kpi.total_idle_periods));
        assert!(!kpi.meets_thresholds(1.1, usize::MAX));
    }
}
