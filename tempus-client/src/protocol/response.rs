//! Decoding of server answers into domain types.
//!
//! Itineraries are decoded fail-closed: an unknown leg tag, an unknown cost
//! code or a missing attribute rejects the whole answer. Catalog answers
//! (plugins) skip unknown elements so newer servers stay readable.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::{
    ConnectionType, Costs, EndMovement, GraphVertex, Itinerary, OptionDescriptor, OptionValue,
    PluginDescriptor, PublicTransportStep, RoadStep, RoadTransportStep, Step, TraceEdge,
    TransferStep, TransportMode, TransportNetwork, Variant,
};
use crate::expr::{Expr, Node};

use super::error::ProtocolError;
use super::fields::{
    add_cost, as_node, cost_kind, flag_attr, flag_text, geometry, leaf_text, parse_attr,
    parse_date_time, required,
};

/// Decode a `<results>` answer into its itineraries, in server order.
///
/// Result-level costs are taken as sent; they are never summed from legs.
pub fn parse_results(expr: &Expr) -> Result<Vec<Itinerary>, ProtocolError> {
    let node = as_node(expr, "results")?;
    node.nodes()
        .map(|result| {
            if result.tag != "result" {
                return Err(ProtocolError::unexpected(&node.tag, &result.tag));
            }
            parse_result(result)
        })
        .collect()
}

fn parse_result(node: &Node) -> Result<Itinerary, ProtocolError> {
    let mut steps = Vec::new();
    let mut costs = Costs::new();
    let mut starting_time = None;
    let mut trace = None;

    for child in node.nodes() {
        match child.tag.as_str() {
            "road_step" => steps.push(Step::Road(parse_road_step(child)?)),
            "public_transport_step" => {
                steps.push(Step::PublicTransport(parse_public_transport_step(child)?))
            }
            "road_transport_step" => {
                steps.push(Step::RoadTransport(parse_road_transport_step(child)?))
            }
            "transfer_step" => steps.push(Step::Transfer(parse_transfer_step(child)?)),
            "cost" => add_cost(&mut costs, child)?,
            "starting_date_time" => {
                starting_time = Some(parse_date_time(child, leaf_text(child)?, "text")?);
            }
            "trace" => trace = Some(parse_trace(child)?),
            other => return Err(ProtocolError::unexpected(&node.tag, other)),
        }
    }

    Ok(Itinerary {
        steps,
        costs,
        starting_time: starting_time
            .ok_or_else(|| ProtocolError::missing(&node.tag, "starting_date_time"))?,
        trace,
    })
}

/// Costs attached to a leg. Legs hold nothing but `<cost>` children.
fn step_costs(node: &Node) -> Result<Costs, ProtocolError> {
    let mut costs = Costs::new();
    for child in node.nodes() {
        if child.tag != "cost" {
            return Err(ProtocolError::unexpected(&node.tag, &child.tag));
        }
        add_cost(&mut costs, child)?;
    }
    Ok(costs)
}

fn parse_road_step(node: &Node) -> Result<RoadStep, ProtocolError> {
    let code: u32 = parse_attr(node, "end_movement")?;
    let end_movement = EndMovement::from_code(code)
        .ok_or_else(|| ProtocolError::invalid(&node.tag, "end_movement", &code.to_string()))?;

    Ok(RoadStep {
        road_name: required(node, "road")?.to_string(),
        end_movement,
        mode: parse_attr(node, "transport_mode")?,
        costs: step_costs(node)?,
        geometry: geometry(node)?,
    })
}

fn parse_public_transport_step(node: &Node) -> Result<PublicTransportStep, ProtocolError> {
    Ok(PublicTransportStep {
        network: required(node, "network")?.to_string(),
        departure_stop: required(node, "departure_stop")?.to_string(),
        arrival_stop: required(node, "arrival_stop")?.to_string(),
        route: required(node, "route")?.to_string(),
        trip_id: parse_attr(node, "trip_id")?,
        mode: parse_attr(node, "transport_mode")?,
        departure_time: parse_attr(node, "departure_time")?,
        arrival_time: parse_attr(node, "arrival_time")?,
        wait_time: parse_attr(node, "wait_time")?,
        costs: step_costs(node)?,
        geometry: geometry(node)?,
    })
}

fn connection_type(node: &Node) -> Result<ConnectionType, ProtocolError> {
    let code: u32 = parse_attr(node, "type")?;
    ConnectionType::from_code(code)
        .ok_or_else(|| ProtocolError::invalid(&node.tag, "type", &code.to_string()))
}

fn parse_road_transport_step(node: &Node) -> Result<RoadTransportStep, ProtocolError> {
    Ok(RoadTransportStep {
        connection_type: connection_type(node)?,
        road: required(node, "road")?.to_string(),
        network: required(node, "network")?.to_string(),
        stop: required(node, "stop")?.to_string(),
        mode: parse_attr(node, "transport_mode")?,
        costs: step_costs(node)?,
        geometry: geometry(node)?,
    })
}

fn parse_transfer_step(node: &Node) -> Result<TransferStep, ProtocolError> {
    Ok(TransferStep {
        connection_type: connection_type(node)?,
        road: required(node, "road")?.to_string(),
        poi: required(node, "poi")?.to_string(),
        mode: parse_attr(node, "transport_mode")?,
        final_mode: parse_attr(node, "final_mode")?,
        costs: step_costs(node)?,
        geometry: geometry(node)?,
    })
}

/// Each child of `<trace>` is one edge: origin vertex, destination vertex,
/// then typed attributes.
fn parse_trace(node: &Node) -> Result<Vec<TraceEdge>, ProtocolError> {
    node.nodes().map(parse_edge).collect()
}

fn parse_edge(node: &Node) -> Result<TraceEdge, ProtocolError> {
    let mut children = node.nodes();
    let origin = children
        .next()
        .ok_or_else(|| ProtocolError::missing(&node.tag, "origin vertex"))?;
    let destination = children
        .next()
        .ok_or_else(|| ProtocolError::missing(&node.tag, "destination vertex"))?;

    let mut variants = BTreeMap::new();
    for child in children {
        let value = match child.tag.as_str() {
            "b" => Variant::Bool(flag_attr(child, "v")?),
            "i" => Variant::Int(parse_attr(child, "v")?),
            "f" => Variant::Float(parse_attr(child, "v")?),
            "s" => Variant::String(required(child, "v")?.to_string()),
            other => return Err(ProtocolError::unexpected(&node.tag, other)),
        };
        variants.insert(required(child, "k")?.to_string(), value);
    }

    Ok(TraceEdge {
        origin: parse_vertex(origin)?,
        destination: parse_vertex(destination)?,
        geometry: geometry(node)?,
        variants,
    })
}

fn parse_vertex(node: &Node) -> Result<GraphVertex, ProtocolError> {
    let id = parse_attr(node, "id")?;
    match node.tag.as_str() {
        "road" => Ok(GraphVertex::Road { id }),
        "poi" => Ok(GraphVertex::Poi { id }),
        "pt" => {
            // the first network when unspecified
            let network = match node.attr("network") {
                Some(_) => parse_attr(node, "network")?,
                None => 1,
            };
            Ok(GraphVertex::PublicTransport { id, network })
        }
        other => Err(ProtocolError::unexpected("edge", other)),
    }
}

/// Decode a `<metrics>` answer into name/value pairs.
pub fn parse_metrics(expr: &Expr) -> Result<BTreeMap<String, String>, ProtocolError> {
    let node = as_node(expr, "metrics")?;
    let mut metrics = BTreeMap::new();
    for metric in node.nodes() {
        if metric.tag != "metric" {
            return Err(ProtocolError::unexpected(&node.tag, &metric.tag));
        }
        metrics.insert(
            required(metric, "name")?.to_string(),
            required(metric, "value")?.to_string(),
        );
    }
    Ok(metrics)
}

/// Decode a typed value element (`bool_value`, `int_value`, ...).
pub fn parse_option_value(node: &Node) -> Result<OptionValue, ProtocolError> {
    match node.tag.as_str() {
        "bool_value" => Ok(OptionValue::Bool(flag_attr(node, "value")?)),
        "int_value" => Ok(OptionValue::Int(parse_attr(node, "value")?)),
        "float_value" => Ok(OptionValue::Float(parse_attr(node, "value")?)),
        "string_value" => Ok(OptionValue::String(required(node, "value")?.to_string())),
        other => Err(ProtocolError::UnsupportedOptionType(other.to_string())),
    }
}

/// `<option name description><default_value><int_value/></default_value></option>`
fn parse_option_descriptor(node: &Node) -> Result<OptionDescriptor, ProtocolError> {
    let holder = node
        .find("default_value")
        .ok_or_else(|| ProtocolError::missing(&node.tag, "default_value"))?;
    let value = holder
        .nodes()
        .next()
        .ok_or_else(|| ProtocolError::missing(&holder.tag, "value element"))?;

    Ok(OptionDescriptor {
        name: required(node, "name")?.to_string(),
        description: required(node, "description")?.to_string(),
        default: parse_option_value(value)?,
    })
}

/// Decode the option declarations of one plugin
/// (`get_option_descriptions` answer).
pub fn parse_option_descriptions(
    expr: &Expr,
) -> Result<BTreeMap<String, OptionDescriptor>, ProtocolError> {
    let node = as_node(expr, "options")?;
    let mut options = BTreeMap::new();
    for option in node.nodes() {
        if option.tag != "option" {
            return Err(ProtocolError::unexpected(&node.tag, &option.tag));
        }
        let descriptor = parse_option_descriptor(option)?;
        options.insert(descriptor.name.clone(), descriptor);
    }
    Ok(options)
}

/// Decode a `plugin_list` answer.
pub fn parse_plugins(expr: &Expr) -> Result<Vec<PluginDescriptor>, ProtocolError> {
    let node = as_node(expr, "plugins")?;
    node.nodes()
        .map(|plugin| {
            if plugin.tag != "plugin" {
                return Err(ProtocolError::unexpected(&node.tag, &plugin.tag));
            }
            parse_plugin(plugin)
        })
        .collect()
}

fn parse_plugin(node: &Node) -> Result<PluginDescriptor, ProtocolError> {
    let mut plugin = PluginDescriptor {
        name: required(node, "name")?.to_string(),
        options: BTreeMap::new(),
        supported_criteria: BTreeSet::new(),
        intermediate_steps: false,
        depart_after: false,
        arrive_before: false,
    };

    for child in node.nodes() {
        match child.tag.as_str() {
            "option" => {
                let option = parse_option_descriptor(child)?;
                plugin.options.insert(option.name.clone(), option);
            }
            "supported_criterion" => {
                plugin.supported_criteria.insert(cost_kind(leaf_text(child)?)?);
            }
            "intermediate_steps" => plugin.intermediate_steps = flag_text(child)?,
            "depart_after" => plugin.depart_after = flag_text(child)?,
            "arrive_before" => plugin.arrive_before = flag_text(child)?,
            other => debug!(plugin = %plugin.name, tag = other, "Skipping unknown plugin element"),
        }
    }
    Ok(plugin)
}

/// Decode a `transport_modes` answer.
pub fn parse_transport_modes(expr: &Expr) -> Result<Vec<TransportMode>, ProtocolError> {
    let node = as_node(expr, "transport_modes")?;
    node.nodes()
        .map(|mode| {
            Ok(TransportMode {
                id: parse_attr(mode, "id")?,
                name: required(mode, "name")?.to_string(),
                is_public_transport: flag_attr(mode, "is_public_transport")?,
                need_parking: flag_attr(mode, "need_parking")?,
                is_shared: flag_attr(mode, "is_shared")?,
                must_be_returned: flag_attr(mode, "must_be_returned")?,
                traffic_rules: parse_attr(mode, "traffic_rules")?,
                speed_rule: parse_attr(mode, "speed_rule")?,
                toll_rules: parse_attr(mode, "toll_rules")?,
                engine_type: parse_attr(mode, "engine_type")?,
            })
        })
        .collect()
}

/// Decode a `transport_networks` answer.
pub fn parse_transport_networks(expr: &Expr) -> Result<Vec<TransportNetwork>, ProtocolError> {
    let node = as_node(expr, "transport_networks")?;
    node.nodes()
        .map(|network| {
            Ok(TransportNetwork {
                id: parse_attr(network, "id")?,
                name: required(network, "name")?.to_string(),
            })
        })
        .collect()
}
