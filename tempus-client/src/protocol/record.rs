//! The XML bundle stored for each history entry.
//!
//! ```xml
//! <record>
//!   <select>plugin, request, options, results, metrics</select>
//!   <server_state>plugins, transport_modes, transport_networks</server_state>
//! </record>
//! ```
//!
//! Children of `select` and `server_state` are positional, as written by the
//! server and by [`build_request`](super::build_request).

use std::collections::BTreeMap;

use crate::domain::{
    Itinerary, OptionValues, PluginDescriptor, Request, TransportMode, TransportNetwork,
};
use crate::expr::{Expr, Node, decode, encode};

use super::error::ProtocolError;
use super::fields::{as_node, required};
use super::request::{parse_plugin_options, parse_request};
use super::response::{
    parse_metrics, parse_plugins, parse_results, parse_transport_modes, parse_transport_networks,
};

/// One `select` call: what was sent and what came back.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectRecord {
    pub plugin: Expr,
    pub request: Expr,
    pub options: Expr,
    pub results: Expr,
    pub metrics: Expr,
}

impl SelectRecord {
    /// Pair a `<select>` bundle from [`build_request`](super::build_request)
    /// with the server's answer.
    pub fn from_bundle(bundle: &Expr, results: Expr, metrics: Expr) -> Result<Self, ProtocolError> {
        let [plugin, request, options] = positional::<3>(bundle, "select")?;
        Ok(Self {
            plugin,
            request,
            options,
            results,
            metrics,
        })
    }

    pub fn to_expr(&self) -> Expr {
        Node::new("select")
            .with_child(self.plugin.clone())
            .with_child(self.request.clone())
            .with_child(self.options.clone())
            .with_child(self.results.clone())
            .with_child(self.metrics.clone())
            .into()
    }

    pub fn from_expr(expr: &Expr) -> Result<Self, ProtocolError> {
        let [plugin, request, options, results, metrics] = positional::<5>(expr, "select")?;
        Ok(Self {
            plugin,
            request,
            options,
            results,
            metrics,
        })
    }
}

/// Snapshot of the server catalogs at request time.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerState {
    pub plugins: Expr,
    pub transport_modes: Expr,
    pub transport_networks: Expr,
}

impl ServerState {
    pub fn to_expr(&self) -> Expr {
        Node::new("server_state")
            .with_child(self.plugins.clone())
            .with_child(self.transport_modes.clone())
            .with_child(self.transport_networks.clone())
            .into()
    }

    pub fn from_expr(expr: &Expr) -> Result<Self, ProtocolError> {
        let [plugins, transport_modes, transport_networks] =
            positional::<3>(expr, "server_state")?;
        Ok(Self {
            plugins,
            transport_modes,
            transport_networks,
        })
    }
}

/// The first `N` element children of a node named `tag`.
fn positional<const N: usize>(expr: &Expr, tag: &str) -> Result<[Expr; N], ProtocolError> {
    let node = as_node(expr, tag)?;
    if node.tag != tag {
        return Err(ProtocolError::unexpected(tag, &node.tag));
    }
    let children: Vec<Expr> = node.nodes().take(N).cloned().map(Expr::Node).collect();
    let found = children.len();
    children
        .try_into()
        .map_err(|_| ProtocolError::missing(tag, &format!("child {} of {N}", found + 1)))
}

/// Serialize a history record.
pub fn encode_record(select: &SelectRecord, server_state: Option<&ServerState>) -> String {
    let mut record = Node::new("record").with_child(select.to_expr());
    if let Some(state) = server_state {
        record.push(state.to_expr());
    }
    encode(&record.into())
}

/// Catalogs decoded from a record's `server_state`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedServerState {
    pub plugins: Vec<PluginDescriptor>,
    pub transport_modes: Vec<TransportMode>,
    pub transport_networks: Vec<TransportNetwork>,
}

/// A fully decoded history record.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
    pub plugin_name: String,
    pub request: Request,
    pub options: OptionValues,
    pub results: Vec<Itinerary>,
    pub metrics: BTreeMap<String, String>,
    pub server_state: Option<LoadedServerState>,
}

/// Decode a stored record. Any malformed part fails the whole record.
pub fn parse_record(xml: &str) -> Result<LoadedRecord, ProtocolError> {
    let expr = decode(xml)?;
    let node = as_node(&expr, "record")?;
    if node.tag != "record" {
        return Err(ProtocolError::unexpected("record", &node.tag));
    }

    let mut nodes = node.nodes();
    let select = nodes
        .next()
        .cloned()
        .map(Expr::Node)
        .ok_or_else(|| ProtocolError::missing("record", "select"))?;
    let select = SelectRecord::from_expr(&select)?;

    let server_state = match nodes.next() {
        Some(state) => {
            let state = ServerState::from_expr(&Expr::Node(state.clone()))?;
            Some(LoadedServerState {
                plugins: parse_plugins(&state.plugins)?,
                transport_modes: parse_transport_modes(&state.transport_modes)?,
                transport_networks: parse_transport_networks(&state.transport_networks)?,
            })
        }
        None => None,
    };

    let plugin = as_node(&select.plugin, "plugin")?;
    Ok(LoadedRecord {
        plugin_name: required(plugin, "name")?.to_string(),
        request: parse_request(&select.request)?,
        options: parse_plugin_options(&select.options)?,
        results: parse_results(&select.results)?,
        metrics: parse_metrics(&select.metrics)?,
        server_state,
    })
}
