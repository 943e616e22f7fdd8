//! Client for the routing service's WPS endpoint.
//!
//! The service exposes its planner as WPS 1.0.0 processes:
//! - catalogs (`plugin_list`, `constant_list`) describe plugins, transport
//!   modes and networks
//! - `select` plans a trip and answers with itineraries and metrics
//! - `connect`, `pre_build` and `build` load the road and transport graphs
//!
//! Calls are blocking and strictly one at a time.

mod client;
mod error;
mod mock;
mod transport;

pub use client::{SelectOutcome, TempusClient};
pub use error::ClientError;
pub use mock::MockTransport;
pub use transport::{HttpTransport, Method, Transport, TransportConfig, TransportResponse};
