//! Locations and time constraints used in requests.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used for every date-time on the wire.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A location: either coordinates or a graph vertex of the routing network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Point {
    Coordinates { x: f64, y: f64 },
    Vertex(i64),
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point::Coordinates { x, y }
    }

    pub fn vertex(id: i64) -> Self {
        Point::Vertex(id)
    }
}

/// Kind of a time constraint. The discriminant is the wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConstraintKind {
    #[default]
    NoConstraint = 0,
    Before = 1,
    After = 2,
}

impl ConstraintKind {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(ConstraintKind::NoConstraint),
            1 => Some(ConstraintKind::Before),
            2 => Some(ConstraintKind::After),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// A time constraint on departure or arrival.
///
/// `at` is sent even for [`ConstraintKind::NoConstraint`], where the server
/// ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub at: NaiveDateTime,
}

impl Constraint {
    pub fn none(at: NaiveDateTime) -> Self {
        Self {
            kind: ConstraintKind::NoConstraint,
            at,
        }
    }

    pub fn before(at: NaiveDateTime) -> Self {
        Self {
            kind: ConstraintKind::Before,
            at,
        }
    }

    pub fn after(at: NaiveDateTime) -> Self {
        Self {
            kind: ConstraintKind::After,
            at,
        }
    }
}
