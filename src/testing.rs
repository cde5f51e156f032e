//! Shared fixtures for unit tests.

use crate::models::{
    Assignment, Day, Faculty, Placement, Room, Section, Subject, TimeSlot, TimetableProblem,
    WeekGrid,
};

/// One section (60 students), two 3-hour theory subjects, one qualified
/// faculty member per subject, two lecture rooms and a lab, Mon–Fri × 6.
pub(crate) fn two_subject_problem() -> TimetableProblem {
    TimetableProblem::new(
        WeekGrid::weekdays(6),
        vec![
            Room::lecture("R1", 60).with_building("Main"),
            Room::lecture("R2", 80).with_building("Annex"),
            Room::lab("L1", 30).with_building("Main"),
        ],
        vec![
            Faculty::new("F1", "D1").with_subject("S1").with_max_hours(10),
            Faculty::new("F2", "D1").with_subject("S2").with_max_hours(10),
        ],
        vec![Section::new("A", "D1", "3", 60)
            .with_subject("S1")
            .with_subject("S2")],
        vec![
            Subject::new("S1", "CS201").with_hours(3, 0),
            Subject::new("S2", "CS202").with_hours(3, 0),
        ],
    )
}

/// Resolves a placement by ids. Panics on unknown ids.
pub(crate) fn placement<'a>(
    problem: &'a TimetableProblem,
    requirement_id: &str,
    day: Day,
    period: u8,
    room_id: &str,
    faculty_id: &str,
) -> Placement<'a> {
    let requirement = problem.requirement(requirement_id).expect("requirement");
    let room = problem.room(room_id).expect("room");
    let faculty = problem.faculty_member(faculty_id).expect("faculty");
    problem
        .placement(requirement, TimeSlot::new(day, period), room, faculty)
        .expect("placement")
}

/// Builds an owned assignment by ids.
pub(crate) fn assignment(
    problem: &TimetableProblem,
    requirement_id: &str,
    day: Day,
    period: u8,
    room_id: &str,
    faculty_id: &str,
) -> Assignment {
    placement(problem, requirement_id, day, period, room_id, faculty_id).to_assignment()
}
