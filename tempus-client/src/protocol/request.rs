//! Encoding of trip requests and plugin options.
//!
//! A `select` call carries three sibling trees: the plugin selector, the
//! request itself and the option values. [`build_request`] returns them
//! wrapped in a `<select>` node, in that order; history records store the
//! same layout.

use std::collections::BTreeSet;

use crate::domain::{
    Constraint, ConstraintKind, CostKind, OptionValue, OptionValues, Point, Request, RequestStep,
};
use crate::expr::{Expr, Node};

use super::error::ProtocolError;
use super::fields::{
    as_node, flag_attr, format_date_time, parse_attr, parse_date_time, parse_text, required,
};
use super::response::parse_option_value;

/// Build the `<select>` bundle for a trip request.
///
/// Criteria are written in the caller's order, which is the server's
/// tie-break priority. Equal inputs give identical trees.
pub fn build_request(
    request: &Request,
    plugin_name: &str,
    options: &OptionValues,
) -> Result<Expr, ProtocolError> {
    request.validate()?;

    let select = Node::new("select")
        .with_child(build_plugin(plugin_name))
        .with_child(build_request_node(request))
        .with_child(build_options(options));
    Ok(select.into())
}

/// The `<plugin name=".."/>` selector.
pub fn build_plugin(plugin_name: &str) -> Node {
    Node::new("plugin").with_attr("name", plugin_name)
}

fn build_request_node(request: &Request) -> Node {
    let mut node = Node::new("request")
        .with_child(point_node("origin", &request.origin))
        .with_child(constraint_node("departure_constraint", &request.departure_constraint));

    if let Some(parking) = &request.parking_location {
        node.push(point_node("parking_location", parking));
    }

    for criterion in &request.criteria {
        node.push(Node::new("optimizing_criterion").with_text(criterion.code().to_string()));
    }

    for network in &request.allowed_networks {
        node.push(Node::new("allowed_network").with_text(network.to_string()));
    }

    for step in &request.steps {
        node.push(
            Node::new("step")
                .with_attr(
                    "private_vehicule_at_destination",
                    bool_text(step.private_vehicle_at_destination),
                )
                .with_child(point_node("destination", &step.destination))
                .with_child(constraint_node("constraint", &step.constraint)),
        );
    }

    for mode in &request.allowed_modes {
        node.push(Node::new("allowed_mode").with_text(mode.to_string()));
    }

    node
}

/// The `<options>` tree, one `<option>` per value.
pub fn build_options(options: &OptionValues) -> Node {
    let mut node = Node::new("options");
    for (name, value) in options {
        node.push(
            Node::new("option")
                .with_attr("name", name.as_str())
                .with_child(option_value_node(value)),
        );
    }
    node
}

/// The typed value element: the tag names the type.
pub fn option_value_node(value: &OptionValue) -> Node {
    let (tag, text) = match value {
        OptionValue::Bool(v) => ("bool_value", bool_text(*v).to_string()),
        OptionValue::Int(v) => ("int_value", v.to_string()),
        OptionValue::Float(v) => ("float_value", v.to_string()),
        OptionValue::String(v) => ("string_value", v.clone()),
    };
    Node::new(tag).with_attr("value", text)
}

fn point_node(tag: &str, point: &Point) -> Node {
    match point {
        Point::Coordinates { x, y } => Node::new(tag)
            .with_attr("x", x.to_string())
            .with_attr("y", y.to_string()),
        Point::Vertex(id) => Node::new(tag).with_attr("vertex", id.to_string()),
    }
}

fn constraint_node(tag: &str, constraint: &Constraint) -> Node {
    Node::new(tag)
        .with_attr("type", constraint.kind.code().to_string())
        .with_attr("date_time", format_date_time(&constraint.at))
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Decode a `<request>` tree back into a [`Request`].
///
/// Used when reloading a stored request for display or replay.
pub fn parse_request(expr: &Expr) -> Result<Request, ProtocolError> {
    let node = as_node(expr, "request")?;

    let mut origin = None;
    let mut departure_constraint = None;
    let mut parking_location = None;
    let mut criteria = Vec::new();
    let mut allowed_networks = BTreeSet::new();
    let mut allowed_modes = BTreeSet::new();
    let mut steps = Vec::new();

    for child in node.nodes() {
        match child.tag.as_str() {
            "origin" => origin = Some(parse_point(child)?),
            "departure_constraint" => departure_constraint = Some(parse_constraint(child)?),
            "parking_location" => parking_location = Some(parse_point(child)?),
            "optimizing_criterion" => {
                let code: u32 = parse_text(child)?;
                let kind = CostKind::from_code(code)
                    .ok_or_else(|| ProtocolError::UnknownCostCode(code.to_string()))?;
                criteria.push(kind);
            }
            "allowed_network" => {
                allowed_networks.insert(parse_text(child)?);
            }
            "allowed_mode" => {
                allowed_modes.insert(parse_text(child)?);
            }
            "step" => steps.push(parse_step(child)?),
            other => return Err(ProtocolError::unexpected(&node.tag, other)),
        }
    }

    let request = Request {
        origin: origin.ok_or_else(|| ProtocolError::missing(&node.tag, "origin"))?,
        departure_constraint: departure_constraint
            .ok_or_else(|| ProtocolError::missing(&node.tag, "departure_constraint"))?,
        parking_location,
        criteria,
        allowed_networks,
        allowed_modes,
        steps,
    };
    request.validate()?;
    Ok(request)
}

fn parse_step(node: &Node) -> Result<RequestStep, ProtocolError> {
    let destination = node
        .find("destination")
        .ok_or_else(|| ProtocolError::missing(&node.tag, "destination"))?;
    let constraint = node
        .find("constraint")
        .ok_or_else(|| ProtocolError::missing(&node.tag, "constraint"))?;

    Ok(RequestStep {
        destination: parse_point(destination)?,
        constraint: parse_constraint(constraint)?,
        private_vehicle_at_destination: flag_attr(node, "private_vehicule_at_destination")?,
    })
}

fn parse_point(node: &Node) -> Result<Point, ProtocolError> {
    if node.attr("vertex").is_some() {
        return Ok(Point::Vertex(parse_attr(node, "vertex")?));
    }
    Ok(Point::Coordinates {
        x: parse_attr(node, "x")?,
        y: parse_attr(node, "y")?,
    })
}

fn parse_constraint(node: &Node) -> Result<Constraint, ProtocolError> {
    let code: u32 = parse_attr(node, "type")?;
    let kind = ConstraintKind::from_code(code)
        .ok_or_else(|| ProtocolError::invalid(&node.tag, "type", &code.to_string()))?;
    let at = parse_date_time(node, required(node, "date_time")?, "date_time")?;
    Ok(Constraint { kind, at })
}

/// Decode an `<options>` tree of `<option name="..">` value pairs.
pub fn parse_plugin_options(expr: &Expr) -> Result<OptionValues, ProtocolError> {
    let node = as_node(expr, "options")?;
    let mut options = OptionValues::new();
    for option in node.nodes() {
        if option.tag != "option" {
            return Err(ProtocolError::unexpected(&node.tag, &option.tag));
        }
        let name = required(option, "name")?;
        let value = option
            .nodes()
            .next()
            .ok_or_else(|| ProtocolError::missing(&option.tag, "value element"))?;
        options.insert(name.to_string(), parse_option_value(value)?);
    }
    Ok(options)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::expr::encode;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn point() -> impl Strategy<Value = Point> {
        prop_oneof![
            (-1e6f64..1e6, -1e6f64..1e6).prop_map(|(x, y)| Point::new(x, y)),
            (0i64..1_000_000).prop_map(Point::vertex),
        ]
    }

    fn criteria() -> impl Strategy<Value = Vec<CostKind>> {
        prop::collection::vec(prop::sample::select(CostKind::ALL.to_vec()), 1..4)
    }

    proptest! {
        #[test]
        fn equal_inputs_encode_identically(
            origin in point(),
            destination in point(),
            criteria in criteria(),
            modes in prop::collection::btree_set(1i64..20, 1..4),
            minutes in 0u32..1440,
        ) {
            let at = NaiveDate::from_ymd_opt(2013, 3, 14)
                .unwrap()
                .and_hms_opt(minutes / 60, minutes % 60, 0)
                .unwrap();
            let make = || {
                Request::new(
                    origin,
                    Constraint::after(at),
                    RequestStep::new(destination, Constraint::none(at)),
                )
                .with_criteria(criteria.clone())
                .with_allowed_modes(modes.clone())
            };
            let a = build_request(&make(), "p", &OptionValues::new()).unwrap();
            let b = build_request(&make(), "p", &OptionValues::new()).unwrap();
            prop_assert_eq!(encode(&a), encode(&b));
        }

        #[test]
        fn stored_requests_reload(
            origin in point(),
            destination in point(),
            criteria in criteria(),
        ) {
            let at = NaiveDate::from_ymd_opt(2013, 3, 14).unwrap().and_hms_opt(9, 30, 0).unwrap();
            let request = Request::new(
                origin,
                Constraint::before(at),
                RequestStep::new(destination, Constraint::after(at)),
            )
            .with_criteria(criteria);
            let expr = build_request(&request, "p", &OptionValues::new()).unwrap();
            let request_node = expr.as_node().unwrap().find("request").unwrap().clone();
            prop_assert_eq!(parse_request(&Expr::Node(request_node)).unwrap(), request);
        }
    }
}
