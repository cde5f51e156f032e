//! Problem definition for one generation run.
//!
//! [`MasterData`] is the read-only snapshot of the CRUD collections a job
//! starts from. [`TimetableProblem`] is the resolved, indexed input the
//! search consumes: the grid, the resources, and the derived requirements.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    derive_requirements, Assignment, AssignmentRequirement, Department, Faculty, Room, Section,
    Student, Subject, TimeSlot, WeekGrid,
};

/// Snapshot of the master-data collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterData {
    pub departments: Vec<Department>,
    pub rooms: Vec<Room>,
    pub faculty: Vec<Faculty>,
    pub subjects: Vec<Subject>,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl MasterData {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a department.
    pub fn with_department(mut self, department: Department) -> Self {
        self.departments.push(department);
        self
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Adds a faculty member.
    pub fn with_faculty(mut self, faculty: Faculty) -> Self {
        self.faculty.push(faculty);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a section.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Adds a student.
    pub fn with_student(mut self, student: Student) -> Self {
        self.students.push(student);
        self
    }
}

/// Resolved input of a generation run.
///
/// Rooms and faculty are kept sorted by id so that candidate enumeration,
/// and therefore every tie-break, follows entity id order.
#[derive(Debug, Clone)]
pub struct TimetableProblem {
    pub grid: WeekGrid,
    pub rooms: Vec<Room>,
    pub faculty: Vec<Faculty>,
    pub sections: Vec<Section>,
    pub subjects: Vec<Subject>,
    pub requirements: Vec<AssignmentRequirement>,
    room_index: HashMap<String, usize>,
    faculty_index: HashMap<String, usize>,
    section_index: HashMap<String, usize>,
    subject_index: HashMap<String, usize>,
    requirement_index: HashMap<String, usize>,
}

/// A prospective assignment with every referenced entity resolved.
///
/// Constraints evaluate placements rather than [`Assignment`]s so the search
/// never allocates while probing candidates.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub requirement: &'a AssignmentRequirement,
    pub section: &'a Section,
    pub subject: &'a Subject,
    pub room: &'a Room,
    pub faculty: &'a Faculty,
    pub slot: TimeSlot,
}

impl Placement<'_> {
    /// Materializes the placement as an owned assignment.
    pub fn to_assignment(&self) -> Assignment {
        Assignment {
            slot: self.slot,
            room_id: self.room.id.clone(),
            faculty_id: self.faculty.id.clone(),
            section_id: self.section.id.clone(),
            subject_id: self.subject.id.clone(),
            kind: self.requirement.kind,
            requirement_id: self.requirement.id.clone(),
        }
    }
}

fn index_by<T>(items: &[T], id: impl Fn(&T) -> &str) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (id(item).to_string(), i))
        .collect()
}

impl TimetableProblem {
    /// Builds a problem, deriving requirements from the sections' subjects.
    pub fn new(
        grid: WeekGrid,
        rooms: Vec<Room>,
        faculty: Vec<Faculty>,
        sections: Vec<Section>,
        subjects: Vec<Subject>,
    ) -> Self {
        let requirements = derive_requirements(&sections, &subjects);
        Self::with_requirements(grid, rooms, faculty, sections, subjects, requirements)
    }

    /// Builds a problem from explicit requirements.
    pub fn with_requirements(
        grid: WeekGrid,
        mut rooms: Vec<Room>,
        mut faculty: Vec<Faculty>,
        sections: Vec<Section>,
        subjects: Vec<Subject>,
        requirements: Vec<AssignmentRequirement>,
    ) -> Self {
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        faculty.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            room_index: index_by(&rooms, |r| &r.id),
            faculty_index: index_by(&faculty, |f| &f.id),
            section_index: index_by(&sections, |s| &s.id),
            subject_index: index_by(&subjects, |s| &s.id),
            requirement_index: index_by(&requirements, |r| &r.id),
            grid,
            rooms,
            faculty,
            sections,
            subjects,
            requirements,
        }
    }

    /// Looks up a room by id.
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.room_index.get(id).map(|&i| &self.rooms[i])
    }

    /// Looks up a faculty member by id.
    pub fn faculty_member(&self, id: &str) -> Option<&Faculty> {
        self.faculty_index.get(id).map(|&i| &self.faculty[i])
    }

    /// Looks up a section by id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.section_index.get(id).map(|&i| &self.sections[i])
    }

    /// Looks up a subject by id.
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subject_index.get(id).map(|&i| &self.subjects[i])
    }

    /// Looks up a requirement by id.
    pub fn requirement(&self, id: &str) -> Option<&AssignmentRequirement> {
        self.requirement_index.get(id).map(|&i| &self.requirements[i])
    }

    /// Total sessions demanded by all requirements.
    pub fn total_sessions(&self) -> usize {
        self.requirements.iter().map(|r| r.occurrences as usize).sum()
    }

    /// Resolves a requirement against a slot, room and faculty member.
    ///
    /// Returns `None` when the requirement references an unknown section or
    /// subject.
    pub fn placement<'a>(
        &'a self,
        requirement: &'a AssignmentRequirement,
        slot: TimeSlot,
        room: &'a Room,
        faculty: &'a Faculty,
    ) -> Option<Placement<'a>> {
        Some(Placement {
            requirement,
            section: self.section(&requirement.section_id)?,
            subject: self.subject(&requirement.subject_id)?,
            room,
            faculty,
            slot,
        })
    }

    /// Resolves an existing assignment. Returns `None` if any id is unknown.
    pub fn resolve(&self, assignment: &Assignment) -> Option<Placement<'_>> {
        let requirement = self.requirement(&assignment.requirement_id)?;
        let room = self.room(&assignment.room_id)?;
        let faculty = self.faculty_member(&assignment.faculty_id)?;
        self.placement(requirement, assignment.slot, room, faculty)
    }
}
