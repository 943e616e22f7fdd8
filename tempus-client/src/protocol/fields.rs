//! Typed access to attributes and leaf text of decoded nodes.

use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::domain::{CostKind, Costs, DATE_TIME_FORMAT};
use crate::expr::{Expr, Node};

use super::error::ProtocolError;

/// The node behind a decoded message.
pub(crate) fn as_node<'a>(expr: &'a Expr, context: &str) -> Result<&'a Node, ProtocolError> {
    expr.as_node()
        .ok_or_else(|| ProtocolError::missing(context, "element content"))
}

pub(crate) fn required<'a>(node: &'a Node, attr: &str) -> Result<&'a str, ProtocolError> {
    node.attr(attr)
        .ok_or_else(|| ProtocolError::missing(&node.tag, &format!("attribute {attr}")))
}

pub(crate) fn parse_attr<T: FromStr>(node: &Node, attr: &str) -> Result<T, ProtocolError> {
    let raw = required(node, attr)?;
    raw.trim()
        .parse()
        .map_err(|_| ProtocolError::invalid(&node.tag, attr, raw))
}

pub(crate) fn parse_text<T: FromStr>(node: &Node) -> Result<T, ProtocolError> {
    let raw = leaf_text(node)?;
    raw.trim()
        .parse()
        .map_err(|_| ProtocolError::invalid(&node.tag, "text", raw))
}

pub(crate) fn leaf_text(node: &Node) -> Result<&str, ProtocolError> {
    node.text()
        .ok_or_else(|| ProtocolError::missing(&node.tag, "text content"))
}

/// Boolean flags come as `1`/`0` or `true`/`false`.
pub(crate) fn parse_flag(node: &Node, raw: &str, field: &str) -> Result<bool, ProtocolError> {
    match raw.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ProtocolError::invalid(&node.tag, field, raw)),
    }
}

pub(crate) fn flag_attr(node: &Node, attr: &str) -> Result<bool, ProtocolError> {
    parse_flag(node, required(node, attr)?, attr)
}

pub(crate) fn flag_text(node: &Node) -> Result<bool, ProtocolError> {
    parse_flag(node, leaf_text(node)?, "text")
}

pub(crate) fn parse_date_time(node: &Node, raw: &str, field: &str) -> Result<NaiveDateTime, ProtocolError> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
        .map_err(|_| ProtocolError::invalid(&node.tag, field, raw))
}

pub(crate) fn format_date_time(at: &NaiveDateTime) -> String {
    at.format(DATE_TIME_FORMAT).to_string()
}

pub(crate) fn cost_kind(raw: &str) -> Result<CostKind, ProtocolError> {
    raw.trim()
        .parse()
        .ok()
        .and_then(CostKind::from_code)
        .ok_or_else(|| ProtocolError::UnknownCostCode(raw.to_string()))
}

/// Parse a `<cost type=".." value=".."/>` element into `costs`.
pub(crate) fn add_cost(costs: &mut Costs, node: &Node) -> Result<(), ProtocolError> {
    let kind = cost_kind(required(node, "type")?)?;
    let value: f64 = parse_attr(node, "value")?;
    costs.insert(kind, value);
    Ok(())
}

/// Hex-encoded WKB from the `wkb` attribute. Absent or empty means no
/// geometry.
pub(crate) fn geometry(node: &Node) -> Result<Option<Vec<u8>>, ProtocolError> {
    match node.attr("wkb").map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => hex::decode(raw)
            .map(Some)
            .map_err(|_| ProtocolError::invalid(&node.tag, "wkb", raw)),
    }
}
