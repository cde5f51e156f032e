//! Soft constraints.
//!
//! Scored, never rejected. Penalties are unweighted here; the catalog
//! multiplies them by the configured weight.
//!
//! | Rule | Penalty |
//! |------|---------|
//! | `TimeOfDayPreference` | faculty preference weight when the slot is in the non-preferred half |
//! | `IdleGaps` | change in the section's idle periods that day (may be negative) |
//! | `DailySpread` | sessions of the same subject/kind the section already has that day |
//! | `BuildingMoves` | adjacent periods the faculty member teaches in another building |

use super::{Constraint, Strength, Verdict};
use crate::models::{Placement, Schedule, TimePreference, TimetableProblem, WeekGrid};

/// Faculty time-of-day preference.
#[derive(Debug, Clone, Copy)]
pub struct TimeOfDayPreference;

impl Constraint for TimeOfDayPreference {
    fn name(&self) -> &'static str {
        "time_preference"
    }

    fn strength(&self) -> Strength {
        Strength::Soft
    }

    fn evaluate(&self, problem: &TimetableProblem, _schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        let morning = problem.grid.is_morning(p.slot.period);
        let unmet = match p.faculty.preference {
            TimePreference::Any => false,
            TimePreference::Morning => !morning,
            TimePreference::Afternoon => morning,
        };
        if unmet {
            Verdict::Penalty(p.faculty.preference_weight)
        } else {
            Verdict::Accept
        }
    }

    fn description(&self) -> &'static str {
        "Faculty time-of-day preference"
    }
}

/// Idle periods between a section's sessions on one day.
///
/// Break periods inside the span are not counted as idle.
#[derive(Debug, Clone, Copy)]
pub struct IdleGaps;

/// Idle periods in a sorted list of occupied periods.
pub fn idle_periods(grid: &WeekGrid, periods: &[u8]) -> usize {
    periods
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            if b <= a + 1 {
                0
            } else {
                (b - a - 1) as usize - grid.breaks_between(a, b)
            }
        })
        .sum()
}

impl Constraint for IdleGaps {
    fn name(&self) -> &'static str {
        "idle_gap"
    }

    fn strength(&self) -> Strength {
        Strength::Soft
    }

    fn evaluate(&self, problem: &TimetableProblem, schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        let mut periods = schedule.section_periods_on(&p.section.id, p.slot.day);
        let before = idle_periods(&problem.grid, &periods);
        if let Err(pos) = periods.binary_search(&p.slot.period) {
            periods.insert(pos, p.slot.period);
        }
        let after = idle_periods(&problem.grid, &periods);
        let delta = after as f64 - before as f64;
        if delta == 0.0 {
            Verdict::Accept
        } else {
            Verdict::Penalty(delta)
        }
    }

    fn description(&self) -> &'static str {
        "Minimize idle gaps in a section's day"
    }
}

/// Spread a subject's weekly sessions across distinct days.
#[derive(Debug, Clone, Copy)]
pub struct DailySpread;

impl Constraint for DailySpread {
    fn name(&self) -> &'static str {
        "same_day_repeat"
    }

    fn strength(&self) -> Strength {
        Strength::Soft
    }

    fn evaluate(&self, _problem: &TimetableProblem, schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        let repeats = schedule.sessions_on_day(&p.section.id, &p.subject.id, p.requirement.kind, p.slot.day);
        if repeats == 0 {
            Verdict::Accept
        } else {
            Verdict::Penalty(repeats as f64)
        }
    }

    fn description(&self) -> &'static str {
        "Avoid repeating a subject on the same day"
    }
}

/// Back-to-back sessions of one faculty member in different buildings.
///
/// Rooms without a building tag never incur this penalty.
#[derive(Debug, Clone, Copy)]
pub struct BuildingMoves;

impl Constraint for BuildingMoves {
    fn name(&self) -> &'static str {
        "building_move"
    }

    fn strength(&self) -> Strength {
        Strength::Soft
    }

    fn evaluate(&self, problem: &TimetableProblem, schedule: &Schedule, p: &Placement<'_>) -> Verdict {
        let Some(building) = p.room.building.as_deref() else {
            return Verdict::Accept;
        };

        let mut moves = 0usize;
        let neighbours = [p.slot.period.checked_sub(1), p.slot.period.checked_add(1)];
        for period in neighbours.into_iter().flatten() {
            let slot = crate::models::TimeSlot::new(p.slot.day, period);
            moves += schedule
                .faculty_occupants(&p.faculty.id, slot)
                .iter()
                .filter_map(|a| problem.room(&a.room_id))
                .filter(|room| room.building.as_deref().is_some_and(|b| b != building))
                .count();
        }

        if moves == 0 {
            Verdict::Accept
        } else {
            Verdict::Penalty(moves as f64)
        }
    }

    fn description(&self) -> &'static str {
        "Minimize back-to-back building changes"
    }
}
