//! Client for a multimodal trip-planning server.
//!
//! The server speaks WPS over HTTP with XML payloads. This crate builds
//! trip requests from typed values, decodes the itineraries that come back,
//! and keeps a local history of past exchanges for replay.
//!
//! - [`expr`]: order-preserving tree model and its XML codec
//! - [`domain`]: points, constraints, requests, itineraries and catalogs
//! - [`protocol`]: request builders and answer parsers
//! - [`client`]: blocking client over a pluggable transport
//! - [`history`]: append-only record archive

pub mod client;
pub mod domain;
pub mod expr;
pub mod history;
pub mod protocol;
