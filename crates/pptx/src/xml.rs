//! Minimal element tree over quick-xml events.
//!
//! Slide XML nests shapes inside groups and tables inside graphic frames, so
//! the analyzer works on a small in-memory tree instead of a flat event
//! stream. Element names are stored without their namespace prefix;
//! attribute keys keep theirs so `id` and `r:id` stay distinct.

use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Local name, e.g. `sp` for `<p:sp>`.
    pub name: String,
    attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(Self::from_start(e)),
                Ok(Event::Empty(ref e)) => {
                    attach(&mut stack, &mut root, Self::from_start(e));
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        Error::XmlError("Unexpected closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::XmlError(format!("Bad text content: {}", e)))?;
                        parent.push_text(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::XmlError(format!("Unclosed element '{}'", open.name)));
        }
        root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))
    }

    fn from_start(e: &BytesStart) -> Self {
        let name = String::from_utf8_lossy(e.name().local_name().as_ref()).to_string();
        let attrs = e
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                let value = match attr.unescape_value() {
                    Ok(v) => v.to_string(),
                    Err(_) => String::from_utf8_lossy(&attr.value).to_string(),
                };
                (key, value)
            })
            .collect();

        Self {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        // Whitespace between elements only matters inside text runs.
        if text.trim().is_empty() && self.name != "t" {
            return;
        }
        self.children.push(XmlNode::Text(text.to_string()));
    }

    /// Value of an unprefixed attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a prefixed attribute by local name, e.g. `id` for `r:id`.
    pub fn ns_attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| matches!(k.split_once(':'), Some((_, l)) if l == local))
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, skipping text nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Direct children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// Follow a path of direct children.
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names.iter().try_fold(self, |el, name| el.child(name))
    }

    /// First descendant (depth first, excluding self) with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given name, in document order.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if child.name == name {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    /// Concatenated text of this element and all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Parse a boolean-ish OOXML attribute value.
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("on"))
}
