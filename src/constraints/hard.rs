//! Hard constraints.
//!
//! A schedule that breaks any of these is invalid.
//!
//! # Categories
//!
//! - **Static** (depend only on the placement): `WithinGrid`, `RoomTypeMatch`,
//!   `RoomCapacity`, `FacultyQualified`, `FacultyAvailable`
//! - **Dynamic** (depend on the partial schedule): `RoomFree`, `FacultyFree`,
//!   `SectionFree`, `FacultyWorkload`

use super::{Constraint, Strength, Verdict};
use crate::conflicts::ConflictKind;
use crate::models::{Placement, Schedule, TimetableProblem};

// ======================== Static rules ========================

/// Sessions only occur on working days, within `[0, periods_per_day)`, and
/// outside break periods.
#[derive(Debug, Clone, Copy)]
pub struct WithinGrid;

impl Constraint for WithinGrid {
    fn name(&self) -> &'static str {
        "within_grid"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn is_static(&self) -> bool {
        true
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::OutsideGrid)
    }

    fn evaluate(&self, problem: &TimetableProblem, _schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        if problem.grid.contains(p.slot) {
            Verdict::Accept
        } else {
            Verdict::Reject(format!("{} is not a teaching slot", p.slot))
        }
    }

    fn description(&self) -> &'static str {
        "Sessions stay within working days and teaching periods"
    }
}

/// Practical sessions need a lab; theory sessions need a lecture or seminar room.
#[derive(Debug, Clone, Copy)]
pub struct RoomTypeMatch;

impl Constraint for RoomTypeMatch {
    fn name(&self) -> &'static str {
        "room_type_match"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn is_static(&self) -> bool {
        true
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::TypeMismatch)
    }

    fn evaluate(&self, _problem: &TimetableProblem, _schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        if p.room.room_type.supports(p.requirement.kind) {
            Verdict::Accept
        } else {
            Verdict::Reject(format!(
                "{} room {} cannot host a {} session",
                p.room.room_type, p.room.id, p.requirement.kind
            ))
        }
    }

    fn description(&self) -> &'static str {
        "Room type matches session kind"
    }
}

/// Room capacity is at least the section's headcount.
#[derive(Debug, Clone, Copy)]
pub struct RoomCapacity;

impl Constraint for RoomCapacity {
    fn name(&self) -> &'static str {
        "room_capacity"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn is_static(&self) -> bool {
        true
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::CapacityExceeded)
    }

    fn evaluate(&self, _problem: &TimetableProblem, _schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        if p.room.capacity >= p.section.size {
            Verdict::Accept
        } else {
            Verdict::Reject(format!(
                "room {} seats {} but section {} has {}",
                p.room.id, p.room.capacity, p.section.id, p.section.size
            ))
        }
    }

    fn description(&self) -> &'static str {
        "Room seats the whole section"
    }
}

/// The faculty member is qualified for the subject.
#[derive(Debug, Clone, Copy)]
pub struct FacultyQualified;

impl Constraint for FacultyQualified {
    fn name(&self) -> &'static str {
        "faculty_qualified"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn is_static(&self) -> bool {
        true
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::UnqualifiedFaculty)
    }

    fn evaluate(&self, _problem: &TimetableProblem, _schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        if p.faculty.is_qualified(&p.subject.id) {
            Verdict::Accept
        } else {
            Verdict::Reject(format!(
                "faculty {} is not qualified for {}",
                p.faculty.id, p.subject.code
            ))
        }
    }

    fn description(&self) -> &'static str {
        "Faculty is qualified for the subject"
    }
}

/// The faculty member is not blocked in the slot.
#[derive(Debug, Clone, Copy)]
pub struct FacultyAvailable;

impl Constraint for FacultyAvailable {
    fn name(&self) -> &'static str {
        "faculty_available"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn is_static(&self) -> bool {
        true
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::FacultyUnavailable)
    }

    fn evaluate(&self, _problem: &TimetableProblem, _schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        if p.faculty.is_available(p.slot) {
            Verdict::Accept
        } else {
            Verdict::Reject(format!("faculty {} is unavailable at {}", p.faculty.id, p.slot))
        }
    }

    fn description(&self) -> &'static str {
        "Faculty is available in the slot"
    }
}

// ======================== Dynamic rules ========================

/// No room holds two sessions in one slot.
#[derive(Debug, Clone, Copy)]
pub struct RoomFree;

impl Constraint for RoomFree {
    fn name(&self) -> &'static str {
        "room_free"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::DoubleBookingRoom)
    }

    fn evaluate(&self, _problem: &TimetableProblem, schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        if schedule.is_room_busy(&p.room.id, p.slot) {
            Verdict::Reject(format!("room {} is already booked at {}", p.room.id, p.slot))
        } else {
            Verdict::Accept
        }
    }

    fn description(&self) -> &'static str {
        "No room double-booking"
    }
}

/// No faculty member teaches two sessions in one slot.
#[derive(Debug, Clone, Copy)]
pub struct FacultyFree;

impl Constraint for FacultyFree {
    fn name(&self) -> &'static str {
        "faculty_free"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::DoubleBookingFaculty)
    }

    fn evaluate(&self, _problem: &TimetableProblem, schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        if schedule.is_faculty_busy(&p.faculty.id, p.slot) {
            Verdict::Reject(format!("faculty {} already teaches at {}", p.faculty.id, p.slot))
        } else {
            Verdict::Accept
        }
    }

    fn description(&self) -> &'static str {
        "No faculty double-booking"
    }
}

/// No section attends two sessions in one slot.
#[derive(Debug, Clone, Copy)]
pub struct SectionFree;

impl Constraint for SectionFree {
    fn name(&self) -> &'static str {
        "section_free"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::DoubleBookingSection)
    }

    fn evaluate(&self, _problem: &TimetableProblem, schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        if schedule.is_section_busy(&p.section.id, p.slot) {
            Verdict::Reject(format!("section {} already has a session at {}", p.section.id, p.slot))
        } else {
            Verdict::Accept
        }
    }

    fn description(&self) -> &'static str {
        "No section double-booking"
    }
}

/// A faculty member's weekly periods stay within their cap.
#[derive(Debug, Clone, Copy)]
pub struct FacultyWorkload;

impl Constraint for FacultyWorkload {
    fn name(&self) -> &'static str {
        "faculty_workload"
    }

    fn strength(&self) -> Strength {
        Strength::Hard
    }

    fn conflict_kind(&self) -> Option<ConflictKind> {
        Some(ConflictKind::OverloadedFaculty)
    }

    fn evaluate(&self, _problem: &TimetableProblem, schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        let hours = schedule.faculty_hours(&p.faculty.id);
        if hours < p.faculty.max_weekly_hours {
            Verdict::Accept
        } else {
            Verdict::Reject(format!(
                "faculty {} already teaches {} of {} weekly hours",
                p.faculty.id, hours, p.faculty.max_weekly_hours
            ))
        }
    }

    fn description(&self) -> &'static str {
        "Faculty weekly hours within cap"
    }
}
