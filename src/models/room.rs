//! Room model.
//!
//! Rooms are the physical resources sessions are held in. A room's type
//! decides which session kinds it can host, and its capacity bounds the
//! section size it can seat.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::SessionKind;

/// A schedulable room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Room number as printed on the door.
    pub number: String,
    /// Room classification.
    pub room_type: RoomType,
    /// Seats available.
    pub capacity: u32,
    /// Building tag. Used to penalize back-to-back moves between buildings.
    pub building: Option<String>,
    /// Owning department, if the room is not shared.
    pub department_id: Option<String>,
}

/// Room classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    /// Lecture hall.
    Lecture,
    /// Laboratory.
    Lab,
    /// Seminar room.
    Seminar,
}

impl RoomType {
    /// Whether a room of this type can host a session of the given kind.
    ///
    /// Practical sessions need a lab; theory sessions need a lecture or
    /// seminar room.
    pub fn supports(self, kind: SessionKind) -> bool {
        match kind {
            SessionKind::Practical => self == RoomType::Lab,
            SessionKind::Theory => matches!(self, RoomType::Lecture | RoomType::Seminar),
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoomType::Lecture => "lecture",
            RoomType::Lab => "lab",
            RoomType::Seminar => "seminar",
        })
    }
}

impl Room {
    /// Creates a new room.
    pub fn new(id: impl Into<String>, room_type: RoomType, capacity: u32) -> Self {
        let id = id.into();
        Self {
            number: id.clone(),
            id,
            room_type,
            capacity,
            building: None,
            department_id: None,
        }
    }

    /// Creates a lecture room.
    pub fn lecture(id: impl Into<String>, capacity: u32) -> Self {
        Self::new(id, RoomType::Lecture, capacity)
    }

    /// Creates a lab.
    pub fn lab(id: impl Into<String>, capacity: u32) -> Self {
        Self::new(id, RoomType::Lab, capacity)
    }

    /// Creates a seminar room.
    pub fn seminar(id: impl Into<String>, capacity: u32) -> Self {
        Self::new(id, RoomType::Seminar, capacity)
    }

    /// Sets the room number.
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    /// Sets the building.
    pub fn with_building(mut self, building: impl Into<String>) -> Self {
        self.building = Some(building.into());
        self
    }

    /// Sets the owning department.
    pub fn with_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    /// Whether the room can host a session of `kind` for `headcount` students.
    pub fn fits(&self, kind: SessionKind, headcount: u32) -> bool {
        self.room_type.supports(kind) && self.capacity >= headcount
    }
}
