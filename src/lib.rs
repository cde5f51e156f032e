//! Academic timetable engine for the U-Engine ecosystem.
//!
//! Turns curriculum master data (departments, rooms, faculty, subjects,
//! sections) into a weekly timetable that satisfies hard constraints and
//! minimizes soft-constraint penalty.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Room`, `Faculty`, `Subject`, `Section`,
//!   `AssignmentRequirement`, `WeekGrid`, `Assignment`, `Schedule`
//! - **`validation`**: Input integrity checks (duplicate IDs, unknown references,
//!   prerequisite cycles, grid shape, constraint overrides)
//! - **`constraints`**: Hard and soft rules behind the `Constraint` trait,
//!   composed into an ordered `ConstraintCatalog`
//! - **`scheduler`**: Backtracking search with forward checking, plus KPIs
//! - **`conflicts`**: Post-hoc and incremental conflict reports
//! - **`jobs`**: Asynchronous generation jobs with snapshot-based polling
//!
//! # Pipeline
//!
//! ```text
//! GenerationRequest ─► validation ─► SearchEngine ─► ConflictDetector ─► JobState
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Russell & Norvig (2020), "Artificial Intelligence", Ch. 6 (CSP, MRV, forward checking)

pub mod config;
pub mod conflicts;
pub mod constraints;
pub mod error;
pub mod jobs;
pub mod models;
pub mod scheduler;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use error::{Error, Result};
