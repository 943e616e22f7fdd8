//! Generic ordered-tree wire value and its XML codec.
//!
//! Every message exchanged with the routing service is an [`Expr`]: either a
//! text payload or a [`Node`] with a tag, ordered attributes and ordered
//! children. The codec in [`codec`] turns these trees into XML and back.
//!
//! A node whose only child is text is a leaf value (`<name>value</name>`);
//! a node with no children is self-closing (`<name/>`).

mod codec;
mod error;

pub use codec::{decode, encode};
pub use error::ExprError;

use std::fmt;

/// A wire tree: a text payload or an element node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Text(String),
    Node(Node),
}

impl Expr {
    /// Returns the node if this is not a text payload.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Expr::Node(node) => Some(node),
            Expr::Text(_) => None,
        }
    }

    /// Returns the text payload if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Expr::Text(text) => Some(text),
            Expr::Node(_) => None,
        }
    }
}

impl From<Node> for Expr {
    fn from(node: Node) -> Self {
        Expr::Node(node)
    }
}

impl From<String> for Expr {
    fn from(text: String) -> Self {
        Expr::Text(text)
    }
}

impl From<&str> for Expr {
    fn from(text: &str) -> Self {
        Expr::Text(text.to_string())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

/// An element: tag, attributes in insertion order, ordered children.
///
/// Equality ignores attribute order, the server treats it as insignificant.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Expr>,
}

impl Node {
    /// Create a childless node without attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute, replacing any previous value under the same name.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: impl Into<Expr>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text payload.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Expr::Text(text.into()))
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn push(&mut self, child: impl Into<Expr>) {
        self.children.push(child.into());
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The text payload of a leaf node (`<tag>text</tag>`).
    pub fn text(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Expr::Text(text)] => Some(text),
            _ => None,
        }
    }

    /// The tag without its namespace prefix (`ows:Identifier` -> `Identifier`).
    pub fn local_name(&self) -> &str {
        local_name(&self.tag)
    }

    /// Element children, skipping text payloads.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(Expr::as_node)
    }

    /// First element child with the given local name.
    pub fn find(&self, local: &str) -> Option<&Node> {
        self.nodes().find(|n| n.local_name() == local)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.tag != other.tag || self.children != other.children {
            return false;
        }
        if self.attrs.len() != other.attrs.len() {
            return false;
        }
        let mut ours: Vec<_> = self.attrs.iter().collect();
        let mut theirs: Vec<_> = other.attrs.iter().collect();
        ours.sort();
        theirs.sort();
        ours == theirs
    }
}

pub(crate) fn local_name(tag: &str) -> &str {
    tag.rsplit_once(':').map_or(tag, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_attribute_order() {
        let a = Node::new("point").with_attr("x", "1").with_attr("y", "2");
        let b = Node::new("point").with_attr("y", "2").with_attr("x", "1");
        assert_eq!(a, b);

        let c = Node::new("point").with_attr("x", "1").with_attr("y", "3");
        assert_ne!(a, c);
    }

    #[test]
    fn set_attr_replaces_existing_value() {
        let node = Node::new("plugin")
            .with_attr("name", "a")
            .with_attr("name", "b");
        assert_eq!(node.attrs.len(), 1);
        assert_eq!(node.attr("name"), Some("b"));
    }

    #[test]
    fn leaf_text_and_lookup() {
        let node = Node::new("wps:Output")
            .with_child(Node::new("ows:Identifier").with_text("plugins"))
            .with_child(Node::new("wps:Data"));

        assert_eq!(node.local_name(), "Output");
        let id = node.find("Identifier").unwrap();
        assert_eq!(id.text(), Some("plugins"));
        assert!(node.find("Data").unwrap().text().is_none());
        assert!(node.find("Title").is_none());
    }
}
