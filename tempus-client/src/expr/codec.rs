//! Conversion between [`Expr`] trees and XML text.
//!
//! Encoding indents nested elements by two spaces per level but never puts
//! whitespace around a leaf's text: the server compares literal values
//! verbatim. Decoding drops whitespace between elements, so the two are
//! inverse for every tree whose nodes hold either element children or a
//! single text payload.

use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};

use super::error::ExprError;
use super::{Expr, Node};

/// Render a tree as XML.
///
/// Numbers are never formatted here: callers store pre-formatted decimal
/// strings in attributes and text.
pub fn encode(expr: &Expr) -> String {
    let mut out = String::new();
    match expr {
        Expr::Node(node) => write_node(&mut out, node, 0),
        Expr::Text(text) => out.push_str(&partial_escape(text)),
    }
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    indent(out, depth);
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }

    match node.children.as_slice() {
        [] => out.push_str("/>\n"),
        [Expr::Text(text)] => {
            out.push('>');
            out.push_str(&partial_escape(text.as_str()));
            close_tag(out, &node.tag);
        }
        children => {
            out.push_str(">\n");
            for child in children {
                match child {
                    Expr::Node(child) => write_node(out, child, depth + 1),
                    Expr::Text(text) => {
                        indent(out, depth + 1);
                        out.push_str(&partial_escape(text.as_str()));
                        out.push('\n');
                    }
                }
            }
            indent(out, depth);
            close_tag(out, &node.tag);
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n(' ', depth * 2));
}

fn close_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}

/// An element whose end tag has not been read yet.
struct OpenNode {
    node: Node,
    text: String,
}

impl OpenNode {
    /// Text only counts for leaves; between elements it must be layout.
    fn close(mut self) -> Result<Node, ExprError> {
        if self.node.children.is_empty() {
            if !self.text.is_empty() {
                self.node.children.push(Expr::Text(self.text));
            }
        } else if !self.text.trim().is_empty() {
            return Err(malformed(&format!("mixed content in <{}>", self.node.tag)));
        }
        Ok(self.node)
    }
}

/// Parse an XML document into a tree.
///
/// The document must hold exactly one root element. A childless element
/// without text becomes a node with no children, never `Text("")`. Nothing
/// is returned unless the whole document parses.
pub fn decode(input: &str) -> Result<Expr, ExprError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<OpenNode> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed("more than one root element"));
                }
                stack.push(OpenNode {
                    node: open_node(&start)?,
                    text: String::new(),
                });
            }
            Event::Empty(start) => {
                let node = open_node(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let open = stack
                    .pop()
                    .ok_or_else(|| malformed("closing tag without opening tag"))?;
                attach(&mut stack, &mut root, open.close()?)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| malformed(&format!("invalid UTF-8 in CDATA: {e}")))?;
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(&format!("unclosed element <{}>", open.node.tag)));
    }

    root.map(Expr::Node)
        .ok_or_else(|| malformed("document has no root element"))
}

fn open_node(start: &BytesStart<'_>) -> Result<Node, ExprError> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| malformed(&format!("invalid UTF-8 in tag name: {e}")))?
        .to_string();

    let mut node = Node::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(&e.to_string()))?;
        let name = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| malformed(&format!("invalid UTF-8 in attribute name: {e}")))?
            .to_string();
        let value = attr.unescape_value()?.into_owned();
        node.attrs.push((name, value));
    }
    Ok(node)
}

fn attach(stack: &mut [OpenNode], root: &mut Option<Node>, node: Node) -> Result<(), ExprError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.node.children.push(Expr::Node(node));
            Ok(())
        }
        None if root.is_some() => Err(malformed("more than one root element")),
        None => {
            *root = Some(node);
            Ok(())
        }
    }
}

fn push_text(stack: &mut [OpenNode], text: &str) -> Result<(), ExprError> {
    match stack.last_mut() {
        Some(open) => {
            open.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(malformed("text outside of the root element")),
    }
}

fn malformed(message: &str) -> ExprError {
    ExprError::MalformedDocument(message.to_string())
}
