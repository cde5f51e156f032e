//! Subject model.
//!
//! Subjects carry NEP 2020 categories and split credit hours: theory hours
//! and practical hours each produce their own weekly sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A curriculum subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Catalog code (e.g., "CS201").
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// NEP category.
    pub category: SubjectCategory,
    /// Weekly theory sessions.
    pub theory_hours: u32,
    /// Weekly practical sessions.
    pub practical_hours: u32,
    /// Subjects that must be completed before this one.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Departments allowed to offer this subject. Empty = any department.
    #[serde(default)]
    pub department_ids: Vec<String>,
}

/// NEP 2020 subject category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubjectCategory {
    /// Discipline-specific core.
    Major,
    /// Secondary discipline.
    Minor,
    /// Skill Enhancement Course.
    #[serde(rename = "SEC")]
    Sec,
    /// Value Added Course.
    #[serde(rename = "VAC")]
    Vac,
    /// Ability Enhancement Course.
    #[serde(rename = "AEC")]
    Aec,
}

impl fmt::Display for SubjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubjectCategory::Major => "Major",
            SubjectCategory::Minor => "Minor",
            SubjectCategory::Sec => "SEC",
            SubjectCategory::Vac => "VAC",
            SubjectCategory::Aec => "AEC",
        })
    }
}

impl Subject {
    /// Creates a new Major subject with no hours.
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: String::new(),
            category: SubjectCategory::Major,
            theory_hours: 0,
            practical_hours: 0,
            prerequisites: Vec::new(),
            department_ids: Vec::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: SubjectCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets weekly theory and practical hours.
    pub fn with_hours(mut self, theory: u32, practical: u32) -> Self {
        self.theory_hours = theory;
        self.practical_hours = practical;
        self
    }

    /// Adds a prerequisite.
    pub fn with_prerequisite(mut self, subject_id: impl Into<String>) -> Self {
        self.prerequisites.push(subject_id.into());
        self
    }

    /// Restricts the subject to a department.
    pub fn with_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_ids.push(department_id.into());
        self
    }

    /// Total weekly sessions.
    #[inline]
    pub fn total_hours(&self) -> u32 {
        self.theory_hours + self.practical_hours
    }

    /// Whether a department may offer this subject.
    pub fn is_offered_by(&self, department_id: &str) -> bool {
        self.department_ids.is_empty() || self.department_ids.iter().any(|d| d == department_id)
    }
}
