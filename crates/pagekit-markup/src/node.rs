//! Markup nodes and static rendering.

use crate::escape::escape_into;

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Errors that can occur while rendering markup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("Invalid attribute name {name:?} on <{tag}>")]
    InvalidAttributeName { tag: String, name: String },

    #[error("Void element <{0}> cannot have children")]
    VoidElementChildren(String),
}

/// Anything that can be serialized to static markup.
pub trait Render {
    /// Append the markup for this value to `out`.
    fn render_into(&self, out: &mut String) -> Result<(), RenderError>;

    /// Render this value to a standalone markup string.
    fn render_to_static_markup(&self) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render_into(&mut out)?;
        Ok(out)
    }
}

/// An element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr {
    /// `name="value"`
    Value(String, String),
    /// Boolean attribute, rendered as `name=""`
    Flag(String),
}

impl Attr {
    /// Attribute name.
    pub fn name(&self) -> &str {
        match self {
            Attr::Value(name, _) | Attr::Flag(name) => name,
        }
    }
}

/// An HTML element with attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<Attr>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attributes in insertion order.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Child nodes.
    pub fn child_nodes(&self) -> &[Node] {
        &self.children
    }

    /// Whether this element is a void element (`<br/>`, `<meta/>`, ...).
    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.to_ascii_lowercase().as_str())
    }

    /// Add a `name="value"` attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(Attr::Value(name.into(), value.into()));
        self
    }

    /// Add a boolean attribute.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(Attr::Flag(name.into()));
        self
    }

    /// Append a child node.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Append several child nodes.
    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Append a text child.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }
}

impl Render for Element {
    fn render_into(&self, out: &mut String) -> Result<(), RenderError> {
        if !is_valid_tag_name(&self.tag) {
            return Err(RenderError::InvalidTagName(self.tag.clone()));
        }

        out.push('<');
        out.push_str(&self.tag);

        for attr in &self.attrs {
            if !is_valid_attr_name(attr.name()) {
                return Err(RenderError::InvalidAttributeName {
                    tag: self.tag.clone(),
                    name: attr.name().to_string(),
                });
            }

            out.push(' ');
            out.push_str(attr.name());
            out.push_str("=\"");
            if let Attr::Value(_, value) = attr {
                escape_into(out, value);
            }
            out.push('"');
        }

        if self.is_void() {
            if !self.children.is_empty() {
                return Err(RenderError::VoidElementChildren(self.tag.clone()));
            }
            out.push_str("/>");
            return Ok(());
        }

        out.push('>');
        for child in &self.children {
            child.render_into(out)?;
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');

        Ok(())
    }
}

/// A node in a markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children
    Element(Element),
    /// Text content, escaped on render
    Text(String),
    /// Pre-rendered markup, emitted verbatim
    Raw(String),
    /// A sequence of sibling nodes with no wrapper
    Fragment(Vec<Node>),
}

impl Render for Node {
    fn render_into(&self, out: &mut String) -> Result<(), RenderError> {
        match self {
            Node::Element(element) => element.render_into(out),
            Node::Text(text) => {
                escape_into(out, text);
                Ok(())
            }
            Node::Raw(html) => {
                out.push_str(html);
                Ok(())
            }
            Node::Fragment(nodes) => {
                for node in nodes {
                    node.render_into(out)?;
                }
                Ok(())
            }
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl From<Vec<Node>> for Node {
    fn from(nodes: Vec<Node>) -> Self {
        Node::Fragment(nodes)
    }
}

/// Create an element.
pub fn element(tag: impl Into<String>) -> Element {
    Element::new(tag)
}

/// Create an escaped text node.
pub fn text(text: impl Into<String>) -> Node {
    Node::Text(text.into())
}

/// Create a node that is emitted without escaping.
pub fn raw(html: impl Into<String>) -> Node {
    Node::Raw(html.into())
}

/// Create a fragment from a list of nodes.
pub fn fragment<I, N>(nodes: I) -> Node
where
    I: IntoIterator<Item = N>,
    N: Into<Node>,
{
    Node::Fragment(nodes.into_iter().map(Into::into).collect())
}

/// The HTML5 doctype declaration.
pub fn doctype() -> Node {
    Node::Raw("<!DOCTYPE html>".to_string())
}

fn is_valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':')
}

fn is_valid_attr_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            !c.is_whitespace()
                && !c.is_control()
                && !matches!(c, '"' | '\'' | '>' | '<' | '/' | '=')
        })
}
