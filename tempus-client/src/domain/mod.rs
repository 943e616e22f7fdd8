//! Domain types for the trip-planning client.
//!
//! Plain values describing requests (points, constraints, steps), results
//! (itineraries made of typed legs, costs, trace diagnostics) and the
//! server's catalogs (plugins, transport modes, networks). Nothing here
//! knows about XML.

mod cost;
mod error;
mod itinerary;
mod network;
mod plugin;
mod point;
mod request;
mod step;
mod trace;

pub use cost::{CostKind, Costs};
pub use error::DomainError;
pub use itinerary::Itinerary;
pub use network::{TransportMode, TransportNetwork};
pub use plugin::{
    OptionDescriptor, OptionValue, OptionValues, PluginDescriptor, PluginRegistry,
};
pub use point::{Constraint, ConstraintKind, DATE_TIME_FORMAT, Point};
pub use request::{Request, RequestStep};
pub use step::{
    ConnectionType, EndMovement, PublicTransportStep, RoadStep, RoadTransportStep, Step,
    TransferStep,
};
pub use trace::{GraphVertex, TraceEdge, Variant};
