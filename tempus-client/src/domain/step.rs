//! Itinerary legs returned by the routing service.

use serde::{Deserialize, Serialize};

use super::cost::Costs;

/// Manoeuvre at the end of a road step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndMovement {
    GoAhead = 0,
    TurnLeft = 1,
    TurnRight = 2,
    UTurn = 3,
    RoundAboutEnter = 4,
    FirstExit = 5,
    SecondExit = 6,
    ThirdExit = 7,
    FourthExit = 8,
    FifthExit = 9,
    SixthExit = 10,
    YouAreArrived = 999,
}

impl EndMovement {
    pub fn from_code(code: u32) -> Option<Self> {
        use EndMovement::*;
        let movement = match code {
            0 => GoAhead,
            1 => TurnLeft,
            2 => TurnRight,
            3 => UTurn,
            4 => RoundAboutEnter,
            5 => FirstExit,
            6 => SecondExit,
            7 => ThirdExit,
            8 => FourthExit,
            9 => FifthExit,
            10 => SixthExit,
            999 => YouAreArrived,
            _ => return None,
        };
        Some(movement)
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// How a connector or transfer step links two networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionType {
    #[default]
    Unknown = 0,
    Road2Road = 1,
    Road2Transport = 2,
    Transport2Road = 3,
    Transport2Transport = 4,
    Road2Poi = 5,
    Poi2Road = 6,
}

impl ConnectionType {
    pub fn from_code(code: u32) -> Option<Self> {
        use ConnectionType::*;
        let connection = match code {
            0 => Unknown,
            1 => Road2Road,
            2 => Road2Transport,
            3 => Transport2Road,
            4 => Transport2Transport,
            5 => Road2Poi,
            6 => Poi2Road,
            _ => return None,
        };
        Some(connection)
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// A leg on the road network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadStep {
    pub road_name: String,
    pub end_movement: EndMovement,
    pub mode: i64,
    pub costs: Costs,
    /// WKB geometry; `None` when the server sent nothing to draw.
    pub geometry: Option<Vec<u8>>,
}

/// A ride on a public transport trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicTransportStep {
    pub network: String,
    pub departure_stop: String,
    pub arrival_stop: String,
    pub route: String,
    pub trip_id: i64,
    pub mode: i64,
    /// Minutes since midnight.
    pub departure_time: f64,
    /// Minutes since midnight.
    pub arrival_time: f64,
    /// Minutes spent waiting before departure.
    pub wait_time: f64,
    pub costs: Costs,
    pub geometry: Option<Vec<u8>>,
}

/// A connector between the road network and a public transport stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadTransportStep {
    pub connection_type: ConnectionType,
    pub road: String,
    pub network: String,
    pub stop: String,
    pub mode: i64,
    pub costs: Costs,
    pub geometry: Option<Vec<u8>>,
}

/// A change of transport mode, possibly at a point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferStep {
    pub connection_type: ConnectionType,
    pub road: String,
    pub poi: String,
    pub mode: i64,
    pub final_mode: i64,
    pub costs: Costs,
    pub geometry: Option<Vec<u8>>,
}

/// One leg of an itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Road(RoadStep),
    PublicTransport(PublicTransportStep),
    RoadTransport(RoadTransportStep),
    Transfer(TransferStep),
}

impl Step {
    pub fn costs(&self) -> &Costs {
        match self {
            Step::Road(step) => &step.costs,
            Step::PublicTransport(step) => &step.costs,
            Step::RoadTransport(step) => &step.costs,
            Step::Transfer(step) => &step.costs,
        }
    }

    /// Transport mode used on this leg.
    pub fn mode(&self) -> i64 {
        match self {
            Step::Road(step) => step.mode,
            Step::PublicTransport(step) => step.mode,
            Step::RoadTransport(step) => step.mode,
            Step::Transfer(step) => step.mode,
        }
    }

    pub fn geometry(&self) -> Option<&[u8]> {
        match self {
            Step::Road(step) => step.geometry.as_deref(),
            Step::PublicTransport(step) => step.geometry.as_deref(),
            Step::RoadTransport(step) => step.geometry.as_deref(),
            Step::Transfer(step) => step.geometry.as_deref(),
        }
    }
}
