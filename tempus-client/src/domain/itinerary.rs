//! Itineraries returned by a trip request.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::cost::{CostKind, Costs};
use super::step::Step;
use super::trace::TraceEdge;

/// One itinerary: ordered legs, the server's total costs and start time.
///
/// `costs` holds only what the server reported; it is never derived from
/// the legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub steps: Vec<Step>,
    pub costs: Costs,
    pub starting_time: NaiveDateTime,
    /// Path-trace diagnostics, present only when the server emitted them.
    pub trace: Option<Vec<TraceEdge>>,
}

impl Itinerary {
    /// True for the degenerate "already there" itinerary.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn cost(&self, kind: CostKind) -> Option<f64> {
        self.costs.get(&kind).copied()
    }
}
