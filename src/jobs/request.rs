//! Generation request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::WeekGrid;

/// Parameters of one generation job.
///
/// `program` is a department id or code. An empty `sections` list selects
/// every section of the program in `semester`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub program: String,
    pub semester: String,
    #[serde(default)]
    pub sections: Vec<String>,
    /// Soft-constraint weight overrides by name (e.g., `"idle_gap"`).
    #[serde(default)]
    pub constraint_overrides: BTreeMap<String, f64>,
    #[serde(default)]
    pub grid: WeekGrid,
}

impl GenerationRequest {
    /// Creates a request for every section of a program's semester on the
    /// default grid.
    pub fn new(program: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            semester: semester.into(),
            sections: Vec::new(),
            constraint_overrides: BTreeMap::new(),
            grid: WeekGrid::default(),
        }
    }

    /// Restricts the run to an explicit section.
    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.sections.push(section_id.into());
        self
    }

    /// Overrides one soft-constraint weight.
    pub fn with_override(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.constraint_overrides.insert(name.into(), weight);
        self
    }

    /// Sets the slot grid.
    pub fn with_grid(mut self, grid: WeekGrid) -> Self {
        self.grid = grid;
        self
    }
}
