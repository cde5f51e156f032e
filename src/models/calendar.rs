//! Weekly slot grid.
//!
//! A generation run schedules sessions on a fixed grid of working days ×
//! periods per day. Break periods (lunch, tea) belong to the grid but are
//! never assignable.
//!
//! # Slot Model
//! Periods are 0-indexed within a day. A [`TimeSlot`] is valid for a grid iff:
//! - its day is one of the grid's working days, AND
//! - its period is in `[0, periods_per_day)`, AND
//! - its period is not a break period.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// Monday through Friday.
    pub const WEEKDAYS: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Three-letter abbreviation.
    pub fn short_name(self) -> &'static str {
        match self {
            Day::Monday => "Mon",
            Day::Tuesday => "Tue",
            Day::Wednesday => "Wed",
            Day::Thursday => "Thu",
            Day::Friday => "Fri",
            Day::Saturday => "Sat",
            Day::Sunday => "Sun",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A (day, period) cell of the weekly grid.
///
/// Ordered by day, then period. This order is the canonical slot order used
/// for deterministic tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Working day.
    pub day: Day,
    /// Period index within the day (0-indexed).
    pub period: u8,
}

impl TimeSlot {
    /// Creates a new slot.
    pub fn new(day: Day, period: u8) -> Self {
        Self { day, period }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} P{}", self.day, self.period)
    }
}

/// The fixed slot grid of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekGrid {
    /// Days on which sessions may be held.
    pub working_days: Vec<Day>,
    /// Number of periods per working day.
    pub periods_per_day: u8,
    /// Periods reserved for breaks on every working day.
    #[serde(default)]
    pub break_periods: BTreeSet<u8>,
}

impl Default for WeekGrid {
    /// Monday to Friday, six periods, no breaks.
    fn default() -> Self {
        Self::weekdays(6)
    }
}

impl WeekGrid {
    /// Creates a grid without breaks. Days are sorted and de-duplicated.
    pub fn new(working_days: impl IntoIterator<Item = Day>, periods_per_day: u8) -> Self {
        let days: BTreeSet<Day> = working_days.into_iter().collect();
        Self {
            working_days: days.into_iter().collect(),
            periods_per_day,
            break_periods: BTreeSet::new(),
        }
    }

    /// Monday to Friday with the given number of periods.
    pub fn weekdays(periods_per_day: u8) -> Self {
        Self::new(Day::WEEKDAYS, periods_per_day)
    }

    /// Marks a period as a break on every working day.
    pub fn with_break(mut self, period: u8) -> Self {
        self.break_periods.insert(period);
        self
    }

    /// Whether a day is a working day.
    pub fn is_working_day(&self, day: Day) -> bool {
        self.working_days.contains(&day)
    }

    /// Whether a period is a break.
    #[inline]
    pub fn is_break(&self, period: u8) -> bool {
        self.break_periods.contains(&period)
    }

    /// Whether a slot may hold a session.
    pub fn contains(&self, slot: TimeSlot) -> bool {
        self.is_working_day(slot.day) && slot.period < self.periods_per_day && !self.is_break(slot.period)
    }

    /// Periods of a day that may hold sessions, in order.
    pub fn teaching_periods(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.periods_per_day).filter(move |p| !self.is_break(*p))
    }

    /// All assignable slots in canonical order.
    pub fn teaching_slots(&self) -> Vec<TimeSlot> {
        let days: BTreeSet<Day> = self.working_days.iter().copied().collect();
        days.into_iter()
            .flat_map(|day| self.teaching_periods().map(move |p| TimeSlot::new(day, p)))
            .collect()
    }

    /// Number of assignable slots per week.
    pub fn teaching_slot_count(&self) -> usize {
        let days: BTreeSet<Day> = self.working_days.iter().copied().collect();
        days.len() * self.teaching_periods().count()
    }

    /// Whether a period falls in the first half of the day.
    ///
    /// With an odd period count the middle period counts as morning.
    pub fn is_morning(&self, period: u8) -> bool {
        period < self.periods_per_day.div_ceil(2)
    }

    /// Number of break periods strictly between two periods.
    pub fn breaks_between(&self, from: u8, to: u8) -> usize {
        if to <= from + 1 {
            return 0;
        }
        self.break_periods.range(from + 1..to).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_ordering() {
        let a = TimeSlot::new(Day::Monday, 5);
        let b = TimeSlot::new(Day::Tuesday, 0);
        let c = TimeSlot::new(Day::Tuesday, 1);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "Mon P5");
    }

    #[test]
    fn test_grid_contains() {
        let grid = WeekGrid::weekdays(6).with_break(3);
        assert!(grid.contains(TimeSlot::new(Day::Monday, 0)));
        assert!(grid.contains(TimeSlot::new(Day::Friday, 5)));
        assert!(!grid.contains(TimeSlot::new(Day::Saturday, 0))); // Not a working day
        assert!(!grid.contains(TimeSlot::new(Day::Monday, 6))); // Out of range
        assert!(!grid.contains(TimeSlot::new(Day::Monday, 3))); // Break
    }

    #[test]
    fn test_teaching_slots() {
        let grid = WeekGrid::new([Day::Wednesday, Day::Monday, Day::Monday], 3).with_break(1);
        let slots = grid.teaching_slots();
        assert_eq!(
            slots,
            vec![
                TimeSlot::new(Day::Monday, 0),
                TimeSlot::new(Day::Monday, 2),
                TimeSlot::new(Day::Wednesday, 0),
                TimeSlot::new(Day::Wednesday, 2),
            ]
        );
        assert_eq!(grid.teaching_slot_count(), 4);
    }

    #[test]
    fn test_morning_split() {
        let even = WeekGrid::weekdays(6);
        assert!(even.is_morning(2));
        assert!(!even.is_morning(3));

        let odd = WeekGrid::weekdays(5);
        assert!(odd.is_morning(2));
        assert!(!odd.is_morning(3));
    }

    #[test]
    fn test_grid_json_keys() {
        let grid = WeekGrid::new([Day::Monday], 4).with_break(2);
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["workingDays"], serde_json::json!(["Monday"]));
        assert_eq!(json["periodsPerDay"], 4);
        assert_eq!(json["breakPeriods"], serde_json::json!([2]));

        let back: WeekGrid = serde_json::from_value(json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_breaks_between() {
        let grid = WeekGrid::weekdays(8).with_break(3).with_break(5);
        assert_eq!(grid.breaks_between(2, 4), 1);
        assert_eq!(grid.breaks_between(1, 7), 2);
        assert_eq!(grid.breaks_between(3, 4), 0);
        assert_eq!(grid.breaks_between(4, 2), 0);
    }
}
