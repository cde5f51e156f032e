//! Weighted, ordered collection of constraints.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{hard, soft, Constraint, Verdict};
use crate::conflicts::ConflictKind;
use crate::models::{Placement, Schedule, TimetableProblem};

/// Soft-constraint weights. A weight of zero disables the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintWeights {
    /// Faculty time-of-day preference.
    pub time_preference: f64,
    /// Idle periods in a section's day.
    pub idle_gap: f64,
    /// Same subject repeated on one day.
    pub same_day_repeat: f64,
    /// Back-to-back building changes for faculty.
    pub building_move: f64,
}

impl Default for ConstraintWeights {
    fn default() -> Self {
        Self {
            time_preference: 1.0,
            idle_gap: 2.0,
            same_day_repeat: 3.0,
            building_move: 1.0,
        }
    }
}

impl ConstraintWeights {
    /// Names accepted by [`get`](Self::get) and [`set`](Self::set).
    pub const NAMES: [&'static str; 4] = ["time_preference", "idle_gap", "same_day_repeat", "building_move"];

    /// Weight of a soft constraint by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "time_preference" => Some(self.time_preference),
            "idle_gap" => Some(self.idle_gap),
            "same_day_repeat" => Some(self.same_day_repeat),
            "building_move" => Some(self.building_move),
            _ => None,
        }
    }

    /// Sets a weight by name.
    ///
    /// # Errors
    /// Unknown names and negative or non-finite weights.
    pub fn set(&mut self, name: &str, weight: f64) -> Result<(), String> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(format!("weight for '{name}' must be a non-negative number, got {weight}"));
        }
        let slot = match name {
            "time_preference" => &mut self.time_preference,
            "idle_gap" => &mut self.idle_gap,
            "same_day_repeat" => &mut self.same_day_repeat,
            "building_move" => &mut self.building_move,
            _ => return Err(format!("unknown soft constraint '{name}'")),
        };
        *slot = weight;
        Ok(())
    }
}

/// Result of evaluating a placement against a whole catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Every hard rule holds; `penalty` is the weighted soft cost.
    Accepted { penalty: f64 },
    /// The first hard rule that failed.
    Rejected {
        constraint: &'static str,
        reason: String,
    },
}

impl Evaluation {
    /// Whether the placement was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Evaluation::Accepted { .. })
    }
}

/// A broken hard rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub constraint: &'static str,
    pub kind: Option<ConflictKind>,
    pub reason: String,
}

#[derive(Clone)]
struct WeightedConstraint {
    constraint: Arc<dyn Constraint>,
    weight: f64,
}

/// Ordered, weighted set of rules.
///
/// Hard rules are checked in insertion order and the first rejection wins.
/// Soft penalties are multiplied by their weight and summed.
#[derive(Clone, Default)]
pub struct ConstraintCatalog {
    hard: Vec<WeightedConstraint>,
    soft: Vec<WeightedConstraint>,
}

impl ConstraintCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in hard rule, plus the soft rules with a positive weight.
    pub fn standard(weights: &ConstraintWeights) -> Self {
        let catalog = Self::new()
            .with_hard(hard::WithinGrid)
            .with_hard(hard::RoomTypeMatch)
            .with_hard(hard::RoomCapacity)
            .with_hard(hard::FacultyQualified)
            .with_hard(hard::FacultyAvailable)
            .with_hard(hard::RoomFree)
            .with_hard(hard::FacultyFree)
            .with_hard(hard::SectionFree)
            .with_hard(hard::FacultyWorkload);

        catalog
            .with_soft(soft::TimeOfDayPreference, weights.time_preference)
            .with_soft(soft::IdleGaps, weights.idle_gap)
            .with_soft(soft::DailySpread, weights.same_day_repeat)
            .with_soft(soft::BuildingMoves, weights.building_move)
    }

    /// Adds a hard rule.
    pub fn with_hard<C: Constraint + 'static>(mut self, constraint: C) -> Self {
        self.hard.push(WeightedConstraint {
            constraint: Arc::new(constraint),
            weight: 1.0,
        });
        self
    }

    /// Adds a soft rule. Non-positive weights leave the catalog unchanged.
    pub fn with_soft<C: Constraint + 'static>(mut self, constraint: C, weight: f64) -> Self {
        if weight > 0.0 {
            self.soft.push(WeightedConstraint {
                constraint: Arc::new(constraint),
                weight,
            });
        }
        self
    }

    /// Number of hard rules.
    pub fn hard_count(&self) -> usize {
        self.hard.len()
    }

    /// Number of active soft rules.
    pub fn soft_count(&self) -> usize {
        self.soft.len()
    }

    /// Evaluates every rule against a placement.
    pub fn evaluate(&self, problem: &TimetableProblem, schedule: &Schedule, placement: &Placement<'_>) -> Evaluation {
        for wc in &self.hard {
            if let Verdict::Reject(reason) = wc.constraint.evaluate(problem, schedule, placement) {
                return Evaluation::Rejected {
                    constraint: wc.constraint.name(),
                    reason,
                };
            }
        }
        Evaluation::Accepted {
            penalty: self.penalty(problem, schedule, placement),
        }
    }

    /// Whether the schedule-independent hard rules admit the placement.
    pub fn admits_static(&self, problem: &TimetableProblem, schedule: &Schedule, placement: &Placement<'_>) -> bool {
        self.hard
            .iter()
            .filter(|wc| wc.constraint.is_static())
            .all(|wc| wc.constraint.evaluate(problem, schedule, placement).is_accepted())
    }

    /// Whether the schedule-dependent hard rules admit the placement.
    pub fn admits_dynamic(&self, problem: &TimetableProblem, schedule: &Schedule, placement: &Placement<'_>) -> bool {
        self.hard
            .iter()
            .filter(|wc| !wc.constraint.is_static())
            .all(|wc| wc.constraint.evaluate(problem, schedule, placement).is_accepted())
    }

    /// Weighted soft cost of a placement.
    pub fn penalty(&self, problem: &TimetableProblem, schedule: &Schedule, placement: &Placement<'_>) -> f64 {
        self.soft
            .iter()
            .map(|wc| match wc.constraint.evaluate(problem, schedule, placement) {
                Verdict::Penalty(p) => p * wc.weight,
                _ => 0.0,
            })
            .sum()
    }

    /// Every hard rule the placement breaks, in catalog order.
    pub fn hard_violations(
        &self,
        problem: &TimetableProblem,
        schedule: &Schedule,
        placement: &Placement<'_>,
    ) -> Vec<Violation> {
        self.hard
            .iter()
            .filter_map(|wc| match wc.constraint.evaluate(problem, schedule, placement) {
                Verdict::Reject(reason) => Some(Violation {
                    constraint: wc.constraint.name(),
                    kind: wc.constraint.conflict_kind(),
                    reason,
                }),
                _ => None,
            })
            .collect()
    }

    /// Violations of the schedule-independent hard rules only.
    pub fn static_violations(
        &self,
        problem: &TimetableProblem,
        schedule: &Schedule,
        placement: &Placement<'_>,
    ) -> Vec<Violation> {
        self.hard
            .iter()
            .filter(|wc| wc.constraint.is_static())
            .filter_map(|wc| match wc.constraint.evaluate(problem, schedule, placement) {
                Verdict::Reject(reason) => Some(Violation {
                    constraint: wc.constraint.name(),
                    kind: wc.constraint.conflict_kind(),
                    reason,
                }),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Debug for ConstraintCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |entries: &[WeightedConstraint]| {
            entries
                .iter()
                .map(|wc| (wc.constraint.name(), wc.weight))
                .collect::<Vec<_>>()
        };
        f.debug_struct("ConstraintCatalog")
            .field("hard", &names(&self.hard))
            .field("soft", &names(&self.soft))
            .finish()
    }
}
