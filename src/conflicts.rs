//! Conflict detection.
//!
//! [`ConflictDetector`] inspects a complete or partial schedule and reports
//! every hard-rule violation and every unmet requirement as a
//! [`ConflictReport`]. It never mutates the schedule, so it may run on an
//! in-progress result.
//!
//! # Checks
//!
//! | Kind | Detection |
//! |------|-----------|
//! | `double_booking_*` | more than one assignment per (slot, room / faculty / section) |
//! | `capacity_exceeded`, `type_mismatch`, `unqualified_faculty`, `faculty_unavailable`, `outside_grid` | static hard rules per assignment |
//! | `overloaded_faculty` | assigned periods above the weekly cap |
//! | `unmet_requirement` | fewer placements than weekly occurrences |
//!
//! Suggested fixes are derived mechanically from the schedule: a free room,
//! a free qualified faculty member, or a free slot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constraints::{ConstraintCatalog, ConstraintWeights, Evaluation, Violation};
use crate::models::{
    Assignment, AssignmentRequirement, Placement, Schedule, TimeSlot, TimetableProblem,
};

/// Category of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    DoubleBookingRoom,
    DoubleBookingFaculty,
    DoubleBookingSection,
    CapacityExceeded,
    TypeMismatch,
    UnqualifiedFaculty,
    OverloadedFaculty,
    UnmetRequirement,
    FacultyUnavailable,
    OutsideGrid,
}

impl ConflictKind {
    /// Snake-case label, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::DoubleBookingRoom => "double_booking_room",
            ConflictKind::DoubleBookingFaculty => "double_booking_faculty",
            ConflictKind::DoubleBookingSection => "double_booking_section",
            ConflictKind::CapacityExceeded => "capacity_exceeded",
            ConflictKind::TypeMismatch => "type_mismatch",
            ConflictKind::UnqualifiedFaculty => "unqualified_faculty",
            ConflictKind::OverloadedFaculty => "overloaded_faculty",
            ConflictKind::UnmetRequirement => "unmet_requirement",
            ConflictKind::FacultyUnavailable => "faculty_unavailable",
            ConflictKind::OutsideGrid => "outside_grid",
        }
    }

    /// Severity of this kind.
    pub fn severity(self) -> Severity {
        match self {
            ConflictKind::DoubleBookingRoom
            | ConflictKind::DoubleBookingFaculty
            | ConflictKind::DoubleBookingSection => Severity::Critical,
            ConflictKind::UnmetRequirement => Severity::Medium,
            _ => Severity::High,
        }
    }

    /// Whether this kind is a hard-rule violation (as opposed to a shortfall).
    pub fn is_hard_violation(self) -> bool {
        self != ConflictKind::UnmetRequirement
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently a conflict needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

/// A single detected conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// `"{kind}-{n}"`, numbered per kind from 1.
    pub id: String,
    pub kind: ConflictKind,
    pub severity: Severity,
    /// Slots involved, ascending.
    pub slots: Vec<TimeSlot>,
    /// Ids of the entities involved (resource first, then requirements).
    pub entities: Vec<String>,
    pub message: String,
    pub suggested_fix: Option<String>,
}

/// Whether any report is a hard-rule violation.
pub fn has_hard_violations(reports: &[ConflictReport]) -> bool {
    reports.iter().any(|r| r.kind.is_hard_violation())
}

#[derive(Default)]
struct ReportBuilder {
    reports: Vec<ConflictReport>,
    counters: BTreeMap<ConflictKind, usize>,
}

impl ReportBuilder {
    fn push(
        &mut self,
        kind: ConflictKind,
        mut slots: Vec<TimeSlot>,
        entities: Vec<String>,
        message: String,
        suggested_fix: Option<String>,
    ) {
        let n = self.counters.entry(kind).or_insert(0);
        *n += 1;
        slots.sort();
        slots.dedup();
        self.reports.push(ConflictReport {
            id: format!("{kind}-{n}"),
            kind,
            severity: kind.severity(),
            slots,
            entities,
            message,
            suggested_fix,
        });
    }
}

/// Produces conflict reports for schedules and prospective placements.
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    catalog: ConstraintCatalog,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(ConstraintCatalog::standard(&ConstraintWeights::default()))
    }
}

impl ConflictDetector {
    /// Creates a detector whose per-assignment checks use `catalog`'s hard rules.
    pub fn new(catalog: ConstraintCatalog) -> Self {
        Self { catalog }
    }

    /// Enumerates every conflict in a schedule.
    ///
    /// Reports are ordered: double bookings (room, faculty, section), per-
    /// assignment rule violations, overloaded faculty, unmet requirements.
    /// Within each group, order follows slot and entity id.
    pub fn detect(&self, problem: &TimetableProblem, schedule: &Schedule) -> Vec<ConflictReport> {
        let mut out = ReportBuilder::default();
        let sorted = schedule.sorted_assignments();

        self.detect_double_bookings(problem, schedule, &sorted, &mut out);
        self.detect_rule_violations(problem, schedule, &sorted, &mut out);
        detect_overload(problem, schedule, &mut out);
        detect_unmet(problem, schedule, &self.catalog, &mut out);

        out.reports
    }

    /// Reports the hard rules a prospective placement would break against
    /// the current schedule. An empty result means the placement is valid.
    pub fn check_placement(
        &self,
        problem: &TimetableProblem,
        schedule: &Schedule,
        placement: &Placement<'_>,
    ) -> Vec<ConflictReport> {
        let mut out = ReportBuilder::default();
        for violation in self.catalog.hard_violations(problem, schedule, placement) {
            let Some(kind) = violation.kind else {
                continue;
            };
            let fix = suggest_fix(problem, schedule, placement, kind);
            out.push(
                kind,
                vec![placement.slot],
                placement_entities(kind, placement),
                violation.reason,
                fix,
            );
        }
        out.reports
    }

    fn detect_double_bookings(
        &self,
        problem: &TimetableProblem,
        schedule: &Schedule,
        sorted: &[Assignment],
        out: &mut ReportBuilder,
    ) {
        let groupings: [(ConflictKind, &str, fn(&Assignment) -> &str); 3] = [
            (ConflictKind::DoubleBookingRoom, "Room", |a| a.room_id.as_str()),
            (ConflictKind::DoubleBookingFaculty, "Faculty", |a| a.faculty_id.as_str()),
            (ConflictKind::DoubleBookingSection, "Section", |a| a.section_id.as_str()),
        ];

        for (kind, label, key) in groupings {
            let mut groups: BTreeMap<(&str, TimeSlot), Vec<&Assignment>> = BTreeMap::new();
            for a in sorted {
                groups.entry((key(a), a.slot)).or_default().push(a);
            }

            for ((entity, slot), members) in groups {
                if members.len() < 2 {
                    continue;
                }
                let mut entities = vec![entity.to_string()];
                entities.extend(members.iter().map(|a| a.requirement_id.clone()));
                let message = format!(
                    "{label} {entity} has {} sessions at {slot}: {}",
                    members.len(),
                    members
                        .iter()
                        .map(|a| a.requirement_id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                let fix = members
                    .last()
                    .and_then(|a| problem.resolve(a))
                    .and_then(|p| suggest_fix(problem, schedule, &p, kind));
                out.push(kind, vec![slot], entities, message, fix);
            }
        }
    }

    fn detect_rule_violations(
        &self,
        problem: &TimetableProblem,
        schedule: &Schedule,
        sorted: &[Assignment],
        out: &mut ReportBuilder,
    ) {
        let empty = Schedule::new();
        for a in sorted {
            let Some(placement) = problem.resolve(a) else {
                tracing::debug!(requirement = %a.requirement_id, "assignment references unknown entities");
                continue;
            };
            let violations: Vec<Violation> = self.catalog.static_violations(problem, &empty, &placement);
            for violation in violations {
                let Some(kind) = violation.kind else {
                    continue;
                };
                let fix = suggest_fix(problem, schedule, &placement, kind);
                out.push(
                    kind,
                    vec![a.slot],
                    placement_entities(kind, &placement),
                    violation.reason,
                    fix,
                );
            }
        }
    }
}

fn placement_entities(kind: ConflictKind, p: &Placement<'_>) -> Vec<String> {
    let resource = match kind {
        ConflictKind::DoubleBookingRoom | ConflictKind::CapacityExceeded | ConflictKind::TypeMismatch => {
            p.room.id.clone()
        }
        ConflictKind::DoubleBookingSection | ConflictKind::OutsideGrid => p.section.id.clone(),
        _ => p.faculty.id.clone(),
    };
    vec![resource, p.requirement.id.clone()]
}

fn detect_overload(problem: &TimetableProblem, schedule: &Schedule, out: &mut ReportBuilder) {
    for faculty in &problem.faculty {
        let hours = schedule.faculty_hours(&faculty.id);
        if hours <= faculty.max_weekly_hours {
            continue;
        }
        let assigned = schedule.assignments_for_faculty(&faculty.id);
        let slots = assigned.iter().map(|a| a.slot).collect();
        let mut entities = vec![faculty.id.clone()];
        let mut requirements: Vec<String> = assigned.iter().map(|a| a.requirement_id.clone()).collect();
        requirements.sort();
        requirements.dedup();
        entities.extend(requirements);

        let excess = hours - faculty.max_weekly_hours;
        out.push(
            ConflictKind::OverloadedFaculty,
            slots,
            entities,
            format!(
                "Faculty {} teaches {hours} periods, {excess} over the weekly cap of {}",
                faculty.id, faculty.max_weekly_hours
            ),
            Some(format!("Reassign {excess} session(s) of {} to another qualified faculty member", faculty.id)),
        );
    }
}

fn detect_unmet(problem: &TimetableProblem, schedule: &Schedule, catalog: &ConstraintCatalog, out: &mut ReportBuilder) {
    for requirement in &problem.requirements {
        let placed = schedule.placed_count(&requirement.id);
        if placed >= requirement.occurrences {
            continue;
        }
        let slots = schedule
            .assignments()
            .iter()
            .filter(|a| a.requirement_id == requirement.id)
            .map(|a| a.slot)
            .collect();
        out.push(
            ConflictKind::UnmetRequirement,
            slots,
            vec![
                requirement.id.clone(),
                requirement.section_id.clone(),
                requirement.subject_id.clone(),
            ],
            format!(
                "{} has {placed} of {} weekly {} sessions",
                requirement.id, requirement.occurrences, requirement.kind
            ),
            first_open_candidate(problem, schedule, catalog, requirement)
                .map(|(slot, room, faculty)| format!("Add a session at {slot} in room {room} with {faculty}")),
        );
    }
}

/// First (slot, room, faculty) in canonical order where every hard rule admits
/// the requirement.
fn first_open_candidate(
    problem: &TimetableProblem,
    schedule: &Schedule,
    catalog: &ConstraintCatalog,
    requirement: &AssignmentRequirement,
) -> Option<(TimeSlot, String, String)> {
    for slot in problem.grid.teaching_slots() {
        for room in &problem.rooms {
            for faculty in &problem.faculty {
                let placement = problem.placement(requirement, slot, room, faculty)?;
                if matches!(catalog.evaluate(problem, schedule, &placement), Evaluation::Accepted { .. }) {
                    return Some((slot, room.id.clone(), faculty.id.clone()));
                }
            }
        }
    }
    None
}

/// Mechanical repair for one offending placement.
fn suggest_fix(
    problem: &TimetableProblem,
    schedule: &Schedule,
    p: &Placement<'_>,
    kind: ConflictKind,
) -> Option<String> {
    match kind {
        ConflictKind::DoubleBookingRoom | ConflictKind::CapacityExceeded | ConflictKind::TypeMismatch => problem
            .rooms
            .iter()
            .find(|r| {
                r.id != p.room.id && r.fits(p.requirement.kind, p.section.size) && !schedule.is_room_busy(&r.id, p.slot)
            })
            .map(|r| format!("Move {} to room {} (free at {})", p.requirement.id, r.id, p.slot)),
        ConflictKind::DoubleBookingFaculty | ConflictKind::UnqualifiedFaculty => problem
            .faculty
            .iter()
            .find(|f| {
                f.id != p.faculty.id
                    && f.is_qualified(&p.subject.id)
                    && f.is_available(p.slot)
                    && !schedule.is_faculty_busy(&f.id, p.slot)
                    && schedule.faculty_hours(&f.id) < f.max_weekly_hours
            })
            .map(|f| format!("Assign {} to faculty {} (free at {})", p.requirement.id, f.id, p.slot)),
        ConflictKind::DoubleBookingSection | ConflictKind::FacultyUnavailable | ConflictKind::OutsideGrid => problem
            .grid
            .teaching_slots()
            .into_iter()
            .find(|&slot| {
                slot != p.slot
                    && p.faculty.is_available(slot)
                    && !schedule.is_room_busy(&p.room.id, slot)
                    && !schedule.is_faculty_busy(&p.faculty.id, slot)
                    && !schedule.is_section_busy(&p.section.id, slot)
            })
            .map(|slot| format!("Move {} to {slot} where room {} is free", p.requirement.id, p.room.id)),
        ConflictKind::OverloadedFaculty | ConflictKind::UnmetRequirement => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, Faculty, Section};
    use crate::testing::{assignment, placement, two_subject_problem};

    fn good_schedule(problem: &TimetableProblem) -> Schedule {
        let mut schedule = Schedule::new();
        for day in [Day::Monday, Day::Tuesday, Day::Wednesday] {
            schedule.add_assignment(assignment(problem, "A:S1:theory", day, 0, "R1", "F1"));
            schedule.add_assignment(assignment(problem, "A:S2:theory", day, 1, "R2", "F2"));
        }
        schedule
    }

    /// The two-subject problem plus a 50-student section B taking `subject`.
    fn with_second_section(subject: &str) -> TimetableProblem {
        let base = two_subject_problem();
        let mut sections = base.sections.clone();
        sections.push(Section::new("B", "D1", "3", 50).with_subject(subject));
        TimetableProblem::new(
            base.grid.clone(),
            base.rooms.clone(),
            base.faculty.clone(),
            sections,
            base.subjects.clone(),
        )
    }

    #[test]
    fn test_known_good_schedule_has_no_conflicts() {
        let problem = two_subject_problem();
        let schedule = good_schedule(&problem);
        assert!(ConflictDetector::default().detect(&problem, &schedule).is_empty());
    }

    #[test]
    fn test_injected_room_double_booking() {
        let problem = with_second_section("S2");
        let mut schedule = good_schedule(&problem);
        // B:S2 takes R1 at Monday P0, where A:S1 already sits
        schedule.add_assignment(assignment(&problem, "B:S2:theory", Day::Monday, 0, "R1", "F2"));
        schedule.add_assignment(assignment(&problem, "B:S2:theory", Day::Thursday, 0, "R1", "F2"));
        schedule.add_assignment(assignment(&problem, "B:S2:theory", Day::Friday, 0, "R1", "F2"));

        let reports = ConflictDetector::default().detect(&problem, &schedule);
        assert_eq!(reports.len(), 1, "{reports:#?}");
        let report = &reports[0];
        assert_eq!(report.kind, ConflictKind::DoubleBookingRoom);
        assert_eq!(report.id, "double_booking_room-1");
        assert_eq!(report.severity, Severity::Critical);
        assert_eq!(report.slots, vec![TimeSlot::new(Day::Monday, 0)]);
        assert_eq!(report.entities, vec!["R1", "A:S1:theory", "B:S2:theory"]);
        assert_eq!(
            report.suggested_fix.as_deref(),
            Some("Move B:S2:theory to room R2 (free at Mon P0)")
        );
    }

    #[test]
    fn test_injected_faculty_double_booking() {
        let problem = with_second_section("S1");
        let mut schedule = good_schedule(&problem);
        // F1 already teaches A at Monday P0
        schedule.add_assignment(assignment(&problem, "B:S1:theory", Day::Monday, 0, "R2", "F1"));
        schedule.add_assignment(assignment(&problem, "B:S1:theory", Day::Thursday, 0, "R2", "F1"));
        schedule.add_assignment(assignment(&problem, "B:S1:theory", Day::Friday, 0, "R2", "F1"));

        let reports = ConflictDetector::default().detect(&problem, &schedule);
        assert_eq!(reports.len(), 1, "{reports:#?}");
        assert_eq!(reports[0].kind, ConflictKind::DoubleBookingFaculty);
        assert_eq!(reports[0].entities, vec!["F1", "A:S1:theory", "B:S1:theory"]);
        // F2 is not qualified for S1
        assert_eq!(reports[0].suggested_fix, None);
    }

    #[test]
    fn test_capacity_and_type_violations() {
        let problem = two_subject_problem();
        let mut schedule = good_schedule(&problem);
        schedule.pop();
        // Last S2 session in the 30-seat lab
        schedule.add_assignment(assignment(&problem, "A:S2:theory", Day::Wednesday, 1, "L1", "F2"));

        let reports = ConflictDetector::default().detect(&problem, &schedule);
        let kinds: Vec<_> = reports.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![ConflictKind::TypeMismatch, ConflictKind::CapacityExceeded]);
        assert_eq!(reports[0].entities, vec!["L1", "A:S2:theory"]);
        assert!(reports[0].suggested_fix.as_deref().unwrap().contains("room R1"));
    }

    #[test]
    fn test_unmet_requirement_with_fix() {
        let problem = two_subject_problem();
        let mut schedule = good_schedule(&problem);
        schedule.pop();

        let reports = ConflictDetector::default().detect(&problem, &schedule);
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.kind, ConflictKind::UnmetRequirement);
        assert_eq!(report.severity, Severity::Medium);
        assert_eq!(report.entities, vec!["A:S2:theory", "A", "S2"]);
        assert_eq!(report.message, "A:S2:theory has 2 of 3 weekly theory sessions");
        assert_eq!(
            report.suggested_fix.as_deref(),
            Some("Add a session at Mon P2 in room R1 with F2")
        );
    }

    #[test]
    fn test_overloaded_faculty() {
        let mut problem = two_subject_problem();
        problem.faculty[0] = Faculty::new("F1", "D1").with_subject("S1").with_max_hours(2);
        let schedule = good_schedule(&problem);

        let reports = ConflictDetector::default().detect(&problem, &schedule);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ConflictKind::OverloadedFaculty);
        assert_eq!(reports[0].slots.len(), 3);
        assert_eq!(reports[0].entities, vec!["F1", "A:S1:theory"]);
    }

    #[test]
    fn test_check_placement() {
        let problem = two_subject_problem();
        let schedule = good_schedule(&problem);
        let detector = ConflictDetector::default();

        let clash = placement(&problem, "A:S1:theory", Day::Monday, 1, "R2", "F1");
        let reports = detector.check_placement(&problem, &schedule, &clash);
        let kinds: Vec<_> = reports.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![ConflictKind::DoubleBookingRoom, ConflictKind::DoubleBookingSection]);
        assert_eq!(reports[0].suggested_fix.as_deref(), Some("Move A:S1:theory to room R1 (free at Mon P1)"));

        let ok = placement(&problem, "A:S1:theory", Day::Thursday, 0, "R1", "F1");
        assert!(detector.check_placement(&problem, &schedule, &ok).is_empty());
    }

    #[test]
    fn test_detect_does_not_mutate() {
        let problem = two_subject_problem();
        let schedule = good_schedule(&problem);
        let before = schedule.clone();
        let _ = ConflictDetector::default().detect(&problem, &schedule);
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_conflict_kind_serde() {
        let json = serde_json::to_string(&ConflictKind::DoubleBookingSection).unwrap();
        assert_eq!(json, "\"double_booking_section\"");
        assert_eq!(ConflictKind::CapacityExceeded.to_string(), "capacity_exceeded");
        assert!(!ConflictKind::UnmetRequirement.is_hard_violation());
        assert!(has_hard_violations(&[ConflictReport {
            id: "outside_grid-1".into(),
            kind: ConflictKind::OutsideGrid,
            severity: Severity::High,
            slots: vec![],
            entities: vec![],
            message: String::new(),
            suggested_fix: None,
        }]));
    }
}
