//! Timetabling domain models.
//!
//! Provides the data types for describing a weekly timetabling problem and
//! its solution.
//!
//! # Domain Mappings
//!
//! | u-timetable | General scheduling |
//! |-------------|--------------------|
//! | AssignmentRequirement | Task (repeated activity) |
//! | Room / Faculty | Resource |
//! | Section | Exclusive consumer group |
//! | TimeSlot | Discrete time bucket |
//! | Schedule | Solution |

mod calendar;
mod department;
mod faculty;
mod problem;
mod requirement;
mod room;
mod schedule;
mod section;
mod subject;

pub use calendar::{Day, TimeSlot, WeekGrid};
pub use department::Department;
pub use faculty::{Faculty, TimePreference};
pub use problem::{MasterData, Placement, TimetableProblem};
pub use requirement::{derive_requirements, AssignmentRequirement, SessionKind};
pub use room::{Room, RoomType};
pub use schedule::{Assignment, Schedule};
pub use section::{effective_headcount, Section, Student};
pub use subject::{Subject, SubjectCategory};
