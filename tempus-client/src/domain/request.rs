//! Trip-planning requests.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::cost::CostKind;
use super::error::DomainError;
use super::point::{Constraint, Point};

/// One intermediate or final destination of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStep {
    pub destination: Point,
    pub constraint: Constraint,
    /// Whether the private vehicle is left at this destination.
    pub private_vehicle_at_destination: bool,
}

impl RequestStep {
    pub fn new(destination: Point, constraint: Constraint) -> Self {
        Self {
            destination,
            constraint,
            private_vehicle_at_destination: false,
        }
    }

    pub fn with_private_vehicle_at_destination(mut self, value: bool) -> Self {
        self.private_vehicle_at_destination = value;
        self
    }
}

/// A complete trip request.
///
/// `criteria` is ordered: the server optimizes lexicographically in this
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub origin: Point,
    pub departure_constraint: Constraint,
    pub parking_location: Option<Point>,
    pub criteria: Vec<CostKind>,
    pub allowed_networks: BTreeSet<i64>,
    pub allowed_modes: BTreeSet<i64>,
    pub steps: Vec<RequestStep>,
}

impl Request {
    /// Create a request from `origin` with a single destination step.
    ///
    /// Optimizes duration and allows walking (mode 1) until told otherwise.
    pub fn new(origin: Point, departure_constraint: Constraint, step: RequestStep) -> Self {
        Self {
            origin,
            departure_constraint,
            parking_location: None,
            criteria: vec![CostKind::Duration],
            allowed_networks: BTreeSet::new(),
            allowed_modes: BTreeSet::from([1]),
            steps: vec![step],
        }
    }

    pub fn with_criteria(mut self, criteria: Vec<CostKind>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_step(mut self, step: RequestStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_parking_location(mut self, location: Point) -> Self {
        self.parking_location = Some(location);
        self
    }

    pub fn with_allowed_modes(mut self, modes: impl IntoIterator<Item = i64>) -> Self {
        self.allowed_modes = modes.into_iter().collect();
        self
    }

    pub fn with_allowed_networks(mut self, networks: impl IntoIterator<Item = i64>) -> Self {
        self.allowed_networks = networks.into_iter().collect();
        self
    }

    /// Check the invariants the server relies on.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.steps.is_empty() {
            return Err(DomainError::InvalidRequest("at least one step is required"));
        }
        if self.criteria.is_empty() {
            return Err(DomainError::InvalidRequest(
                "at least one optimizing criterion is required",
            ));
        }
        Ok(())
    }
}
