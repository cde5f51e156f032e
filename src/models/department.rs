//! Department model.

use serde::{Deserialize, Serialize};

/// An academic department. Owns faculty and sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Unique department identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Short code (e.g., "CSE"). Generation requests name programs by code or id.
    pub code: String,
}

impl Department {
    /// Creates a new department.
    pub fn new(id: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: code.into(),
        }
    }

    /// Whether a program key refers to this department (by id or code).
    pub fn matches_program(&self, program: &str) -> bool {
        self.id == program || self.code.eq_ignore_ascii_case(program)
    }
}
