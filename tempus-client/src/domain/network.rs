//! Transport modes and public transport networks known to the server.

use serde::{Deserialize, Serialize};

/// A transport mode and the rules attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportMode {
    pub id: i64,
    pub name: String,
    pub is_public_transport: bool,
    pub need_parking: bool,
    pub is_shared: bool,
    pub must_be_returned: bool,
    /// Bit field of traffic rules.
    pub traffic_rules: i64,
    pub speed_rule: i64,
    /// Bit field of toll rules.
    pub toll_rules: i64,
    pub engine_type: i64,
}

/// A public transport network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportNetwork {
    pub id: i64,
    pub name: String,
}
