//! Faculty model.
//!
//! Faculty members teach sessions. Each has a weekly teaching-hour cap, a set
//! of subjects they are qualified for, blocked slots, and a time-of-day
//! preference used as a soft constraint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::TimeSlot;

/// A faculty member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    /// Unique faculty identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning department.
    pub department_id: String,
    /// Maximum teaching periods per week.
    pub max_weekly_hours: u32,
    /// Subjects this faculty member may teach.
    pub qualified_subjects: BTreeSet<String>,
    /// Slots in which the faculty member is unavailable.
    /// Empty = always available.
    #[serde(default)]
    pub unavailable: BTreeSet<TimeSlot>,
    /// Preferred time of day.
    #[serde(default)]
    pub preference: TimePreference,
    /// Multiplier applied to the time-preference penalty (1.0 = normal).
    #[serde(default = "default_preference_weight")]
    pub preference_weight: f64,
}

fn default_preference_weight() -> f64 {
    1.0
}

/// Preferred part of the teaching day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePreference {
    /// No preference.
    #[default]
    Any,
    /// First half of the day.
    Morning,
    /// Second half of the day.
    Afternoon,
}

impl Faculty {
    /// Creates a new faculty member (16 weekly hours, no qualifications).
    pub fn new(id: impl Into<String>, department_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            department_id: department_id.into(),
            max_weekly_hours: 16,
            qualified_subjects: BTreeSet::new(),
            unavailable: BTreeSet::new(),
            preference: TimePreference::Any,
            preference_weight: 1.0,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the weekly hour cap.
    pub fn with_max_hours(mut self, hours: u32) -> Self {
        self.max_weekly_hours = hours;
        self
    }

    /// Adds a qualified subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.qualified_subjects.insert(subject_id.into());
        self
    }

    /// Blocks a slot.
    pub fn with_unavailable(mut self, slot: TimeSlot) -> Self {
        self.unavailable.insert(slot);
        self
    }

    /// Sets the time-of-day preference and its weight.
    pub fn with_preference(mut self, preference: TimePreference, weight: f64) -> Self {
        self.preference = preference;
        self.preference_weight = weight.max(0.0);
        self
    }

    /// Whether this faculty member may teach a subject.
    pub fn is_qualified(&self, subject_id: &str) -> bool {
        self.qualified_subjects.contains(subject_id)
    }

    /// Whether this faculty member is available in a slot.
    pub fn is_available(&self, slot: TimeSlot) -> bool {
        !self.unavailable.contains(&slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Day;

    #[test]
    fn test_faculty_builder() {
        let f = Faculty::new("F1", "D1")
            .with_name("Dr. Rao")
            .with_max_hours(12)
            .with_subject("S1")
            .with_subject("S2")
            .with_preference(TimePreference::Morning, 2.0);

        assert_eq!(f.max_weekly_hours, 12);
        assert!(f.is_qualified("S1"));
        assert!(!f.is_qualified("S3"));
        assert_eq!(f.preference, TimePreference::Morning);
        assert!((f.preference_weight - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_availability() {
        let blocked = TimeSlot::new(Day::Monday, 0);
        let f = Faculty::new("F1", "D1").with_unavailable(blocked);
        assert!(!f.is_available(blocked));
        assert!(f.is_available(TimeSlot::new(Day::Monday, 1)));
    }

    #[test]
    fn test_negative_preference_weight_clamped() {
        let f = Faculty::new("F1", "D1").with_preference(TimePreference::Afternoon, -3.0);
        assert!((f.preference_weight - 0.0).abs() < 1e-10);
    }
}
