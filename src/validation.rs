//! Input validation for generation requests.
//!
//! Checks structural integrity of the master-data snapshot and the request
//! before any search starts. Detects:
//! - Duplicate IDs
//! - Unknown department, subject and section references
//! - Subjects without hours, or not offered by a section's department
//! - Circular prerequisite chains (DAG validation)
//! - Empty section selection, rooms or faculty
//! - Malformed slot grids and weight overrides
//!
//! Every check runs; all problems are reported together.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::EngineConfig;
use crate::constraints::ConstraintWeights;
use crate::jobs::GenerationRequest;
use crate::models::{effective_headcount, Department, MasterData, Section, TimetableProblem, WeekGrid};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Two entities of one collection share an ID.
    DuplicateId,
    /// A reference points to an entity that doesn't exist.
    UnknownReference,
    /// A subject has neither theory nor practical hours.
    EmptySubject,
    /// A section takes a subject its department may not offer.
    IneligibleSubject,
    /// Prerequisite graph contains a cycle.
    CyclicPrerequisite,
    /// The request selects no sections.
    EmptySelection,
    /// The selected sections produce nothing to schedule.
    NoRequirements,
    /// No rooms in the snapshot.
    NoRooms,
    /// No faculty in the snapshot.
    NoFaculty,
    /// The slot grid is malformed.
    InvalidGrid,
    /// A constraint weight override is unknown or out of range.
    InvalidOverride,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn check_duplicates<'a>(
    collection: &str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {collection} ID: {id}"),
            ));
        }
    }
    seen
}

/// Validates a master-data snapshot.
///
/// Checks:
/// 1. No duplicate IDs within any collection
/// 2. Sections, faculty, rooms and subjects reference existing departments
/// 3. Sections reference existing subjects, offered by their department
/// 4. Every subject has at least one theory or practical hour
/// 5. Prerequisites exist and form no cycle
/// 6. Students reference existing sections
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_master_data(master: &MasterData) -> ValidationResult {
    let mut errors = Vec::new();

    let department_ids = check_duplicates("department", master.departments.iter().map(|d| d.id.as_str()), &mut errors);
    check_duplicates("room", master.rooms.iter().map(|r| r.id.as_str()), &mut errors);
    check_duplicates("faculty", master.faculty.iter().map(|f| f.id.as_str()), &mut errors);
    let subject_ids = check_duplicates("subject", master.subjects.iter().map(|s| s.id.as_str()), &mut errors);
    let section_ids = check_duplicates("section", master.sections.iter().map(|s| s.id.as_str()), &mut errors);
    check_duplicates("student", master.students.iter().map(|s| s.id.as_str()), &mut errors);

    let mut unknown = |what: String| {
        errors.push(ValidationError::new(ValidationErrorKind::UnknownReference, what));
    };

    for room in &master.rooms {
        if let Some(dept) = &room.department_id {
            if !department_ids.contains(dept.as_str()) {
                unknown(format!("Room '{}' references unknown department '{dept}'", room.id));
            }
        }
    }
    for member in &master.faculty {
        if !department_ids.contains(member.department_id.as_str()) {
            unknown(format!(
                "Faculty '{}' references unknown department '{}'",
                member.id, member.department_id
            ));
        }
        for subject in &member.qualified_subjects {
            if !subject_ids.contains(subject.as_str()) {
                unknown(format!("Faculty '{}' is qualified for unknown subject '{subject}'", member.id));
            }
        }
    }
    for subject in &master.subjects {
        for dept in &subject.department_ids {
            if !department_ids.contains(dept.as_str()) {
                unknown(format!("Subject '{}' references unknown department '{dept}'", subject.id));
            }
        }
        for prereq in &subject.prerequisites {
            if !subject_ids.contains(prereq.as_str()) {
                unknown(format!("Subject '{}' requires unknown subject '{prereq}'", subject.id));
            }
        }
    }
    for section in &master.sections {
        if !department_ids.contains(section.department_id.as_str()) {
            unknown(format!(
                "Section '{}' references unknown department '{}'",
                section.id, section.department_id
            ));
        }
        for subject in &section.subject_ids {
            if !subject_ids.contains(subject.as_str()) {
                unknown(format!("Section '{}' takes unknown subject '{subject}'", section.id));
            }
        }
    }
    for student in &master.students {
        if let Some(section) = &student.section_id {
            if !section_ids.contains(section.as_str()) {
                unknown(format!("Student '{}' is allocated to unknown section '{section}'", student.id));
            }
        }
    }

    for subject in &master.subjects {
        if subject.total_hours() == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptySubject,
                format!("Subject '{}' has no theory or practical hours", subject.id),
            ));
        }
    }

    let subjects: HashMap<&str, _> = master.subjects.iter().map(|s| (s.id.as_str(), s)).collect();
    for section in &master.sections {
        for subject_id in &section.subject_ids {
            if let Some(subject) = subjects.get(subject_id.as_str()) {
                if !subject.is_offered_by(&section.department_id) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::IneligibleSubject,
                        format!(
                            "Section '{}' takes subject '{}' not offered by department '{}'",
                            section.id, subject_id, section.department_id
                        ),
                    ));
                }
            }
        }
    }

    if let Some(err) = detect_prerequisite_cycles(master) {
        errors.push(err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a slot grid against the configured period limit.
pub fn validate_grid(grid: &WeekGrid, max_periods_per_day: u8) -> ValidationResult {
    let mut errors = Vec::new();
    let mut invalid = |message: String| {
        errors.push(ValidationError::new(ValidationErrorKind::InvalidGrid, message));
    };

    if grid.working_days.is_empty() {
        invalid("Grid has no working days".to_string());
    }
    if grid.periods_per_day == 0 || grid.periods_per_day > max_periods_per_day {
        invalid(format!(
            "periods_per_day must be between 1 and {max_periods_per_day}, got {}",
            grid.periods_per_day
        ));
    }
    if let Some(&p) = grid.break_periods.iter().find(|&&p| p >= grid.periods_per_day) {
        invalid(format!("Break period {p} is outside the day"));
    }
    if grid.periods_per_day > 0 && grid.teaching_periods().next().is_none() {
        invalid("Every period of the day is a break".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Runs every input check for a request and resolves it into a problem.
///
/// Returns the problem together with the effective soft-constraint weights
/// (configured defaults with the request's overrides applied). Selected
/// sections carry their effective headcount as `size`.
pub fn build_problem(
    master: &MasterData,
    request: &GenerationRequest,
    config: &EngineConfig,
) -> Result<(TimetableProblem, ConstraintWeights), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(errs) = validate_master_data(master) {
        errors.extend(errs);
    }
    if let Err(errs) = validate_grid(&request.grid, config.max_periods_per_day) {
        errors.extend(errs);
    }

    let mut weights = config.weights.clone();
    for (name, &weight) in &request.constraint_overrides {
        if let Err(reason) = weights.set(name, weight) {
            errors.push(ValidationError::new(ValidationErrorKind::InvalidOverride, reason));
        }
    }

    if master.rooms.is_empty() {
        errors.push(ValidationError::new(ValidationErrorKind::NoRooms, "No rooms available"));
    }
    if master.faculty.is_empty() {
        errors.push(ValidationError::new(ValidationErrorKind::NoFaculty, "No faculty available"));
    }

    let sections = match resolve_program(master, &request.program) {
        Some(department) => select_sections(master, department, request, &mut errors),
        None => {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!("Unknown program '{}'", request.program),
            ));
            Vec::new()
        }
    };

    let problem = TimetableProblem::new(
        request.grid.clone(),
        master.rooms.clone(),
        master.faculty.clone(),
        sections,
        master.subjects.clone(),
    );
    if !problem.sections.is_empty() && problem.requirements.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoRequirements,
            "Selected sections have no subjects to schedule",
        ));
    }

    if errors.is_empty() {
        Ok((problem, weights))
    } else {
        Err(errors)
    }
}

fn resolve_program<'a>(master: &'a MasterData, program: &str) -> Option<&'a Department> {
    master
        .departments
        .iter()
        .find(|d| d.id == program)
        .or_else(|| master.departments.iter().find(|d| d.matches_program(program)))
}

fn select_sections(
    master: &MasterData,
    department: &Department,
    request: &GenerationRequest,
    errors: &mut Vec<ValidationError>,
) -> Vec<Section> {
    let in_scope = |s: &Section| s.department_id == department.id && s.semester == request.semester;

    let selected: Vec<&Section> = if request.sections.is_empty() {
        master.sections.iter().filter(|s| in_scope(s)).collect()
    } else {
        let mut seen = HashSet::new();
        let mut picked = Vec::new();
        for id in &request.sections {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match master.sections.iter().find(|s| &s.id == id) {
                Some(section) if in_scope(section) => picked.push(section),
                Some(_) => errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!(
                        "Section '{id}' is not part of program '{}' semester '{}'",
                        department.code, request.semester
                    ),
                )),
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!("Unknown section '{id}'"),
                )),
            }
        }
        picked
    };

    if selected.is_empty() && request.sections.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptySelection,
            format!(
                "Program '{}' has no sections in semester '{}'",
                department.code, request.semester
            ),
        ));
    }

    selected
        .into_iter()
        .map(|section| {
            let mut section = section.clone();
            section.size = effective_headcount(&section, &master.students);
            section
        })
        .collect()
}

/// Detects cycles in the prerequisite graph using DFS.
///
/// Uses the classic "white/gray/black" coloring approach: if we reach a
/// gray node (currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_prerequisite_cycles(master: &MasterData) -> Option<ValidationError> {
    // Adjacency: prerequisite → subjects that require it
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for subject in &master.subjects {
        for prereq in &subject.prerequisites {
            adj.entry(prereq.as_str()).or_default().push(subject.id.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for subject in &master.subjects {
        let node = subject.id.as_str();
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicPrerequisite,
                format!("Circular prerequisite chain involving subject '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}
