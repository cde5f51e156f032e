//! Schedule (solution) model.
//!
//! A schedule is an arena of assignments indexed by room, faculty and section
//! per slot, so the search can answer "is this resource free at this slot?"
//! without scanning. Assignments are appended and removed in stack order,
//! which is exactly how backtracking uses them.
//!
//! Only the assignment list is serialized; indices are rebuilt on load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::{Day, SessionKind, TimeSlot};

/// One placed session: requirement × slot × room × faculty.
///
/// Section, subject and kind are denormalized from the requirement for query
/// convenience.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Slot the session occupies.
    pub slot: TimeSlot,
    /// Room hosting the session.
    pub room_id: String,
    /// Faculty member teaching.
    pub faculty_id: String,
    /// Section attending.
    pub section_id: String,
    /// Subject taught.
    pub subject_id: String,
    /// Session kind.
    pub kind: SessionKind,
    /// Requirement this session counts toward.
    pub requirement_id: String,
}

type SlotIndex = HashMap<String, BTreeMap<TimeSlot, Vec<usize>>>;

/// A (possibly partial) timetable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ScheduleRecord", into = "ScheduleRecord")]
pub struct Schedule {
    assignments: Vec<Assignment>,
    by_room: SlotIndex,
    by_faculty: SlotIndex,
    by_section: SlotIndex,
    faculty_hours: HashMap<String, u32>,
    placed: HashMap<String, u32>,
}

#[derive(Serialize, Deserialize)]
struct ScheduleRecord {
    assignments: Vec<Assignment>,
}

impl From<ScheduleRecord> for Schedule {
    fn from(record: ScheduleRecord) -> Self {
        record.assignments.into_iter().collect()
    }
}

impl From<Schedule> for ScheduleRecord {
    fn from(schedule: Schedule) -> Self {
        Self {
            assignments: schedule.assignments,
        }
    }
}

impl FromIterator<Assignment> for Schedule {
    fn from_iter<I: IntoIterator<Item = Assignment>>(iter: I) -> Self {
        let mut schedule = Schedule::new();
        for a in iter {
            schedule.add_assignment(a);
        }
        schedule
    }
}

impl PartialEq for Schedule {
    fn eq(&self, other: &Self) -> bool {
        self.assignments == other.assignments
    }
}

impl Eq for Schedule {}

fn index_push(index: &mut SlotIndex, key: &str, slot: TimeSlot, position: usize) {
    index
        .entry(key.to_string())
        .or_default()
        .entry(slot)
        .or_default()
        .push(position);
}

fn index_pop(index: &mut SlotIndex, key: &str, slot: TimeSlot) {
    if let Some(slots) = index.get_mut(key) {
        if let Some(positions) = slots.get_mut(&slot) {
            positions.pop();
            if positions.is_empty() {
                slots.remove(&slot);
            }
        }
        if slots.is_empty() {
            index.remove(key);
        }
    }
}

fn occupants<'a>(index: &'a SlotIndex, key: &str, slot: TimeSlot) -> &'a [usize] {
    index
        .get(key)
        .and_then(|slots| slots.get(&slot))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn day_range(day: Day) -> std::ops::RangeInclusive<TimeSlot> {
    TimeSlot::new(day, 0)..=TimeSlot::new(day, u8::MAX)
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an assignment.
    ///
    /// No constraint checking happens here; the schedule can represent
    /// broken timetables so the conflict detector can report on them.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        let position = self.assignments.len();
        index_push(&mut self.by_room, &assignment.room_id, assignment.slot, position);
        index_push(&mut self.by_faculty, &assignment.faculty_id, assignment.slot, position);
        index_push(&mut self.by_section, &assignment.section_id, assignment.slot, position);
        *self.faculty_hours.entry(assignment.faculty_id.clone()).or_insert(0) += 1;
        *self.placed.entry(assignment.requirement_id.clone()).or_insert(0) += 1;
        self.assignments.push(assignment);
    }

    /// Removes and returns the most recently added assignment.
    pub fn pop(&mut self) -> Option<Assignment> {
        let assignment = self.assignments.pop()?;
        index_pop(&mut self.by_room, &assignment.room_id, assignment.slot);
        index_pop(&mut self.by_faculty, &assignment.faculty_id, assignment.slot);
        index_pop(&mut self.by_section, &assignment.section_id, assignment.slot);
        decrement(&mut self.faculty_hours, &assignment.faculty_id);
        decrement(&mut self.placed, &assignment.requirement_id);
        Some(assignment)
    }

    /// All assignments in insertion order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Assignments sorted canonically (slot, room, faculty, ...).
    pub fn sorted_assignments(&self) -> Vec<Assignment> {
        let mut sorted = self.assignments.clone();
        sorted.sort();
        sorted
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the schedule holds no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Whether a room is used in a slot.
    #[inline]
    pub fn is_room_busy(&self, room_id: &str, slot: TimeSlot) -> bool {
        !occupants(&self.by_room, room_id, slot).is_empty()
    }

    /// Whether a faculty member teaches in a slot.
    #[inline]
    pub fn is_faculty_busy(&self, faculty_id: &str, slot: TimeSlot) -> bool {
        !occupants(&self.by_faculty, faculty_id, slot).is_empty()
    }

    /// Whether a section attends a session in a slot.
    #[inline]
    pub fn is_section_busy(&self, section_id: &str, slot: TimeSlot) -> bool {
        !occupants(&self.by_section, section_id, slot).is_empty()
    }

    /// Assignments using a room in a slot.
    pub fn room_occupants(&self, room_id: &str, slot: TimeSlot) -> Vec<&Assignment> {
        self.resolve(occupants(&self.by_room, room_id, slot))
    }

    /// Assignments taught by a faculty member in a slot.
    pub fn faculty_occupants(&self, faculty_id: &str, slot: TimeSlot) -> Vec<&Assignment> {
        self.resolve(occupants(&self.by_faculty, faculty_id, slot))
    }

    /// Assignments attended by a section in a slot.
    pub fn section_occupants(&self, section_id: &str, slot: TimeSlot) -> Vec<&Assignment> {
        self.resolve(occupants(&self.by_section, section_id, slot))
    }

    /// Periods taught by a faculty member this week.
    pub fn faculty_hours(&self, faculty_id: &str) -> u32 {
        self.faculty_hours.get(faculty_id).copied().unwrap_or(0)
    }

    /// Sessions placed for a requirement.
    pub fn placed_count(&self, requirement_id: &str) -> u32 {
        self.placed.get(requirement_id).copied().unwrap_or(0)
    }

    /// Occupied periods of a section on a day, ascending.
    pub fn section_periods_on(&self, section_id: &str, day: Day) -> Vec<u8> {
        self.by_section
            .get(section_id)
            .map(|slots| slots.range(day_range(day)).map(|(slot, _)| slot.period).collect())
            .unwrap_or_default()
    }

    /// Sessions of a subject/kind a section already has on a day.
    pub fn sessions_on_day(&self, section_id: &str, subject_id: &str, kind: SessionKind, day: Day) -> usize {
        self.by_section
            .get(section_id)
            .map(|slots| {
                slots
                    .range(day_range(day))
                    .flat_map(|(_, positions)| positions.iter())
                    .filter(|&&i| {
                        let a = &self.assignments[i];
                        a.subject_id == subject_id && a.kind == kind
                    })
                    .count()
            })
            .unwrap_or(0)
    }

    /// Returns all assignments for a section.
    pub fn assignments_for_section(&self, section_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.section_id == section_id)
            .collect()
    }

    /// Returns all assignments for a faculty member.
    pub fn assignments_for_faculty(&self, faculty_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.faculty_id == faculty_id)
            .collect()
    }

    /// Returns all assignments for a room.
    pub fn assignments_for_room(&self, room_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.room_id == room_id)
            .collect()
    }

    /// Room utilization: occupied slots / teaching slots.
    ///
    /// Returns `None` if `teaching_slots` is zero.
    pub fn room_utilization(&self, room_id: &str, teaching_slots: usize) -> Option<f64> {
        if teaching_slots == 0 {
            return None;
        }
        let busy = self.by_room.get(room_id).map(BTreeMap::len).unwrap_or(0);
        Some(busy as f64 / teaching_slots as f64)
    }

    fn resolve(&self, positions: &[usize]) -> Vec<&Assignment> {
        positions.iter().map(|&i| &self.assignments[i]).collect()
    }
}

fn decrement(counts: &mut HashMap<String, u32>, key: &str) {
    if let Some(n) = counts.get_mut(key) {
        *n -= 1;
        if *n == 0 {
            counts.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(req: &str, day: Day, period: u8, room: &str, faculty: &str, section: &str) -> Assignment {
        Assignment {
            slot: TimeSlot::new(day, period),
            room_id: room.into(),
            faculty_id: faculty.into(),
            section_id: section.into(),
            subject_id: req.split(':').nth(1).unwrap_or("S").into(),
            kind: SessionKind::Theory,
            requirement_id: req.into(),
        }
    }

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(assignment("A:S1:theory", Day::Monday, 0, "R1", "F1", "A"));
        s.add_assignment(assignment("A:S1:theory", Day::Monday, 2, "R1", "F1", "A"));
        s.add_assignment(assignment("B:S2:theory", Day::Monday, 0, "R2", "F2", "B"));
        s
    }

    #[test]
    fn test_busy_lookups() {
        let s = sample_schedule();
        let mon0 = TimeSlot::new(Day::Monday, 0);
        assert!(s.is_room_busy("R1", mon0));
        assert!(s.is_faculty_busy("F2", mon0));
        assert!(s.is_section_busy("A", mon0));
        assert!(!s.is_room_busy("R1", TimeSlot::new(Day::Monday, 1)));
        assert!(!s.is_faculty_busy("F9", mon0));
    }

    #[test]
    fn test_counters() {
        let s = sample_schedule();
        assert_eq!(s.assignment_count(), 3);
        assert_eq!(s.faculty_hours("F1"), 2);
        assert_eq!(s.placed_count("A:S1:theory"), 2);
        assert_eq!(s.placed_count("missing"), 0);
    }

    #[test]
    fn test_pop_restores_indices() {
        let mut s = sample_schedule();
        let popped = s.pop().unwrap();
        assert_eq!(popped.room_id, "R2");
        assert!(!s.is_room_busy("R2", TimeSlot::new(Day::Monday, 0)));
        assert!(!s.is_section_busy("B", TimeSlot::new(Day::Monday, 0)));
        assert_eq!(s.faculty_hours("F2"), 0);
        assert_eq!(s.placed_count("B:S2:theory"), 0);

        s.pop();
        s.pop();
        assert!(s.is_empty());
        assert!(s.pop().is_none());
    }

    #[test]
    fn test_double_booking_representable() {
        let mut s = sample_schedule();
        s.add_assignment(assignment("B:S3:theory", Day::Monday, 0, "R1", "F3", "B"));
        assert_eq!(s.room_occupants("R1", TimeSlot::new(Day::Monday, 0)).len(), 2);
        assert_eq!(s.section_occupants("B", TimeSlot::new(Day::Monday, 0)).len(), 2);

        s.pop();
        assert_eq!(s.room_occupants("R1", TimeSlot::new(Day::Monday, 0)).len(), 1);
    }

    #[test]
    fn test_section_day_queries() {
        let s = sample_schedule();
        assert_eq!(s.section_periods_on("A", Day::Monday), vec![0, 2]);
        assert!(s.section_periods_on("A", Day::Tuesday).is_empty());
        assert_eq!(s.sessions_on_day("A", "S1", SessionKind::Theory, Day::Monday), 2);
        assert_eq!(s.sessions_on_day("A", "S1", SessionKind::Practical, Day::Monday), 0);
    }

    #[test]
    fn test_room_utilization() {
        let s = sample_schedule();
        let util = s.room_utilization("R1", 30).unwrap();
        assert!((util - 2.0 / 30.0).abs() < 1e-10);
        assert_eq!(s.room_utilization("R1", 0), None);
        assert_eq!(s.room_utilization("R9", 30), Some(0.0));
    }

    #[test]
    fn test_resource_filters() {
        let s = sample_schedule();
        assert_eq!(s.assignments_for_section("A").len(), 2);
        assert_eq!(s.assignments_for_faculty("F2").len(), 1);
        assert_eq!(s.assignments_for_room("R1").len(), 2);
    }

    #[test]
    fn test_from_iterator_matches_incremental() {
        let s = sample_schedule();
        let rebuilt: Schedule = s.assignments().iter().cloned().collect();
        assert_eq!(rebuilt, s);
        assert_eq!(rebuilt.faculty_hours("F1"), 2);
    }
}
