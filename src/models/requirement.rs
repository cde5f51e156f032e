//! Assignment requirements.
//!
//! A requirement is a (section, subject, session kind) triple that must be
//! placed a fixed number of times per week. Requirements are derived from
//! master data, never supplied directly.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::{Section, Subject};

/// Theory or practical component of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Theory,
    Practical,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionKind::Theory => "theory",
            SessionKind::Practical => "practical",
        })
    }
}

/// A subject-section pairing that must be scheduled `occurrences` times a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequirement {
    /// Stable identifier: `{section}:{subject}:{kind}`.
    pub id: String,
    /// Section attending.
    pub section_id: String,
    /// Subject taught.
    pub subject_id: String,
    /// Session kind.
    pub kind: SessionKind,
    /// Required weekly sessions.
    pub occurrences: u32,
}

impl AssignmentRequirement {
    /// Creates a requirement with the canonical id.
    pub fn new(
        section_id: impl Into<String>,
        subject_id: impl Into<String>,
        kind: SessionKind,
        occurrences: u32,
    ) -> Self {
        let section_id = section_id.into();
        let subject_id = subject_id.into();
        Self {
            id: format!("{section_id}:{subject_id}:{kind}"),
            section_id,
            subject_id,
            kind,
            occurrences,
        }
    }
}

/// Derives requirements for the given sections.
///
/// For each section (in order) and each of its subjects (in order, duplicates
/// ignored), emits a theory requirement when the subject has theory hours and
/// a practical requirement when it has practical hours. Unknown subject ids
/// are skipped; validation reports them.
///
/// The occurrences of a (section, subject) pair always sum to the subject's
/// `theory_hours + practical_hours`.
pub fn derive_requirements(sections: &[Section], subjects: &[Subject]) -> Vec<AssignmentRequirement> {
    let subject_map: HashMap<&str, &Subject> = subjects.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut requirements = Vec::new();

    for section in sections {
        let mut seen = HashSet::new();
        for subject_id in &section.subject_ids {
            if !seen.insert(subject_id.as_str()) {
                continue;
            }
            let Some(subject) = subject_map.get(subject_id.as_str()) else {
                continue;
            };
            if subject.theory_hours > 0 {
                requirements.push(AssignmentRequirement::new(
                    &section.id,
                    &subject.id,
                    SessionKind::Theory,
                    subject.theory_hours,
                ));
            }
            if subject.practical_hours > 0 {
                requirements.push(AssignmentRequirement::new(
                    &section.id,
                    &subject.id,
                    SessionKind::Practical,
                    subject.practical_hours,
                ));
            }
        }
    }

    requirements
}
