//! Section and student models.

use serde::{Deserialize, Serialize};

/// A student group that attends sessions together.
///
/// A section follows a fixed list of subjects in its semester. Those subjects
/// and their credit hours produce the section's assignment requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique section identifier.
    pub id: String,
    /// Owning department.
    pub department_id: String,
    /// Semester label (e.g., "3").
    pub semester: String,
    /// Section name (e.g., "A").
    pub name: String,
    /// Declared headcount.
    pub size: u32,
    /// Subjects taken this semester.
    #[serde(default)]
    pub subject_ids: Vec<String>,
}

impl Section {
    /// Creates a new section.
    pub fn new(
        id: impl Into<String>,
        department_id: impl Into<String>,
        semester: impl Into<String>,
        size: u32,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            department_id: department_id.into(),
            semester: semester.into(),
            size,
            subject_ids: Vec::new(),
        }
    }

    /// Sets the section name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_ids.push(subject_id.into());
        self
    }
}

/// An enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Unique student identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// University enrollment number.
    pub enrollment_no: String,
    /// Home department.
    pub department_id: Option<String>,
    /// Current semester label.
    pub semester: String,
    /// Section the student attends, if allocated.
    pub section_id: Option<String>,
}

impl Student {
    /// Creates a new student.
    pub fn new(id: impl Into<String>, enrollment_no: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            enrollment_no: enrollment_no.into(),
            department_id: None,
            semester: semester.into(),
            section_id: None,
        }
    }

    /// Allocates the student to a section.
    pub fn in_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }
}

/// Effective headcount of a section: the larger of its declared size and the
/// number of students allocated to it.
pub fn effective_headcount(section: &Section, students: &[Student]) -> u32 {
    let enrolled = students
        .iter()
        .filter(|s| s.section_id.as_deref() == Some(section.id.as_str()))
        .count() as u32;
    section.size.max(enrolled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_builder() {
        let s = Section::new("SEC-A", "D1", "3", 60)
            .with_name("A")
            .with_subject("S1")
            .with_subject("S2");
        assert_eq!(s.name, "A");
        assert_eq!(s.subject_ids.len(), 2);
    }

    #[test]
    fn test_effective_headcount() {
        let section = Section::new("A", "D1", "3", 2);
        let students = vec![
            Student::new("st1", "E1", "3").in_section("A"),
            Student::new("st2", "E2", "3").in_section("A"),
            Student::new("st3", "E3", "3").in_section("A"),
            Student::new("st4", "E4", "3").in_section("B"),
            Student::new("st5", "E5", "3"),
        ];
        assert_eq!(effective_headcount(&section, &students), 3);

        let big = Section::new("A", "D1", "3", 60);
        assert_eq!(effective_headcount(&big, &students), 60);
    }
}
