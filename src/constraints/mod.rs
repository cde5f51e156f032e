//! Constraint catalog.
//!
//! Every timetabling rule implements [`Constraint`]: given the current partial
//! schedule and a prospective [`Placement`], it returns a [`Verdict`]. Hard
//! rules accept or reject; soft rules accept with a penalty. Rules are
//! composed into an ordered [`ConstraintCatalog`] with per-rule weights, so
//! which rules apply and how much they matter is configuration.
//!
//! # Usage
//!
//! ```
//! use u_timetable::constraints::{hard, soft, ConstraintCatalog, ConstraintWeights};
//!
//! let catalog = ConstraintCatalog::standard(&ConstraintWeights::default());
//! assert_eq!(catalog.hard_count(), 9);
//!
//! let custom = ConstraintCatalog::new()
//!     .with_hard(hard::RoomFree)
//!     .with_soft(soft::DailySpread, 5.0);
//! assert_eq!(custom.soft_count(), 1);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling", §3
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

mod catalog;
pub mod hard;
pub mod soft;

pub use catalog::{ConstraintCatalog, ConstraintWeights, Evaluation, Violation};

use crate::conflicts::ConflictKind;
use crate::models::{Placement, Schedule, TimetableProblem};
use std::fmt::Debug;

/// Outcome of evaluating one constraint against a placement.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The placement satisfies the rule.
    Accept,
    /// The placement breaks the rule.
    Reject(String),
    /// The placement is allowed at the given (unweighted) cost.
    Penalty(f64),
}

impl Verdict {
    /// Whether the verdict allows the placement.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Verdict::Reject(_))
    }
}

/// Whether a rule invalidates a schedule or only ranks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Hard,
    Soft,
}

/// A timetabling rule.
///
/// # Contract
/// Hard rules return [`Verdict::Accept`] or [`Verdict::Reject`]. Soft rules
/// return [`Verdict::Penalty`] (or `Accept` for zero cost); lower is better.
/// Evaluation must not depend on anything but its arguments, which keeps the
/// search deterministic.
pub trait Constraint: Send + Sync + Debug {
    /// Rule name (e.g., "room_free").
    fn name(&self) -> &'static str;

    /// Hard or soft.
    fn strength(&self) -> Strength;

    /// Evaluates a prospective placement against the partial schedule.
    fn evaluate(
        &self,
        problem: &TimetableProblem,
        schedule: &Schedule,
        placement: &Placement<'_>,
    ) -> Verdict;

    /// Whether the verdict depends only on the placement, never on the schedule.
    ///
    /// Static hard rules are applied once when candidate domains are built.
    fn is_static(&self) -> bool {
        false
    }

    /// Conflict kind reported when this rule is broken.
    fn conflict_kind(&self) -> Option<ConflictKind> {
        None
    }

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_acceptance() {
        assert!(Verdict::Accept.is_accepted());
        assert!(Verdict::Penalty(3.0).is_accepted());
        assert!(!Verdict::Reject("no".into()).is_accepted());
    }
}
