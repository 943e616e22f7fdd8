//! Path-trace diagnostics: the graph edges an algorithm examined.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A vertex of the multimodal graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphVertex {
    Road { id: i64 },
    Poi { id: i64 },
    PublicTransport { id: i64, network: i64 },
}

/// A dynamically typed attribute value attached to a trace edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// One examined edge with the algorithm's internal attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEdge {
    pub origin: GraphVertex,
    pub destination: GraphVertex,
    pub geometry: Option<Vec<u8>>,
    pub variants: BTreeMap<String, Variant>,
}
