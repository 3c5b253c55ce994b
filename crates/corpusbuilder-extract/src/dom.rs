//! Tagged document tree.
//!
//! A lenient element tree over journal-archiving markup: unknown entities,
//! stray end tags and unclosed elements are tolerated the way an HTML parser
//! would tolerate them. Extractors only read the tree; pruning happens on
//! explicit copies (`Node::without`), never on the shared document.

use std::borrow::Cow;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};

use crate::error::{ExtractError, Result};

const ROOT_NAME: &str = "#document";

/// Deepest element nesting accepted. Tree walks recurse per level.
pub const MAX_DEPTH: usize = 256;

/// Character references some publishers emit that render as odd glyphs.
const ENCODING_REPLACEMENTS: [(&str, &str); 2] = [("&#x000a0;", " "), ("&#x02212;", "-")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Element(Node),
    Text(String),
}

/// One element: tag name, ordered attributes, ordered mixed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Content>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Content::Element(child));
        self
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        // Adjacent text runs (e.g. around a resolved entity) are merged.
        if let Some(Content::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(Content::Text(text));
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn children(&self) -> &[Content] {
        &self.children
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Content::Element(node) => Some(node),
            Content::Text(_) => None,
        })
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Node> = self.elements().collect();
        stack.reverse();
        Descendants { stack }
    }

    /// First descendant with the given tag name (depth-first).
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.descendants().find(|n| n.name == name)
    }

    pub fn find_all(&self, name: &str) -> Vec<&Node> {
        self.descendants().filter(|n| n.name == name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Descendants named `name` whose attributes start with the given
    /// prefixes, e.g. `select("pub-date", &[("pub-type", "epub")])`.
    pub fn select(&self, name: &str, prefixes: &[(&str, &str)]) -> Vec<&Node> {
        self.descendants()
            .filter(|n| n.name == name)
            .filter(|n| {
                prefixes.iter().all(|(key, prefix)| {
                    n.attr(key).is_some_and(|value| value.starts_with(prefix))
                })
            })
            .collect()
    }

    /// Concatenated text of this subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Content::Text(text) => out.push_str(text),
                Content::Element(node) => node.collect_text(out),
            }
        }
    }

    /// Text of the first descendant named `name`, if present.
    pub fn find_text(&self, name: &str) -> Option<String> {
        self.find(name).map(Node::text)
    }

    /// Detach every descendant element named `name`.
    pub fn decompose(&mut self, name: &str) {
        self.children
            .retain(|c| !matches!(c, Content::Element(node) if node.name == name));
        for child in &mut self.children {
            if let Content::Element(node) = child {
                node.decompose(name);
            }
        }
    }

    /// A copy of this subtree with the named elements removed.
    pub fn without(&self, names: &[&str]) -> Node {
        let mut copy = self.clone();
        for name in names {
            copy.decompose(name);
        }
        copy
    }

    /// Serialize the subtree back to markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Content::Text(text) => out.push_str(&partial_escape(text.as_str())),
                Content::Element(node) => node.write_markup(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(node.elements());
        self.stack[start..].reverse();
        Some(node)
    }
}

/// A parsed document. The root is a synthetic container around the
/// top-level elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Node,
}

impl Document {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = Self::parse(&raw)?;
        if doc.root.elements().next().is_none() {
            return Err(ExtractError::EmptyDocument(path.to_path_buf()));
        }
        Ok(doc)
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let xml = replace_encodings(xml);
        let mut reader = Reader::from_str(&xml);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;

        let mut stack = vec![Node::new(ROOT_NAME)];
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    // The synthetic root sits at the bottom of the stack.
                    if stack.len() > MAX_DEPTH {
                        return Err(ExtractError::Xml(format!(
                            "nesting too deep at byte {}: more than {MAX_DEPTH} levels",
                            reader.buffer_position()
                        )));
                    }
                    stack.push(element_from(&e));
                }
                Ok(Event::Empty(e)) => attach(&mut stack, element_from(&e)),
                Ok(Event::End(e)) => {
                    let name = lossy(e.name().as_ref()).to_ascii_lowercase();
                    close(&mut stack, &name);
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape_with(resolve_entity)
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| unescape_lenient(&lossy(&e)));
                    current(&mut stack).push_text(text);
                }
                Ok(Event::CData(e)) => {
                    let text = lossy(&e).into_owned();
                    current(&mut stack).push_text(text);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ExtractError::Xml(format!(
                        "at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        // Close anything left open.
        while stack.len() > 1 {
            if let Some(node) = stack.pop() {
                attach(&mut stack, node);
            }
        }
        let root = stack.pop().unwrap_or_else(|| Node::new(ROOT_NAME));
        Ok(Self { root })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn find(&self, name: &str) -> Option<&Node> {
        self.root.find(name)
    }

    pub fn find_all(&self, name: &str) -> Vec<&Node> {
        self.root.find_all(name)
    }

    pub fn select(&self, name: &str, prefixes: &[(&str, &str)]) -> Vec<&Node> {
        self.root.select(name, prefixes)
    }
}

fn replace_encodings(xml: &str) -> Cow<'_, str> {
    if !ENCODING_REPLACEMENTS.iter().any(|(from, _)| xml.contains(from)) {
        return Cow::Borrowed(xml);
    }
    let mut out = xml.to_string();
    for (from, to) in ENCODING_REPLACEMENTS {
        out = out.replace(from, to);
    }
    Cow::Owned(out)
}

fn element_from(start: &BytesStart<'_>) -> Node {
    let mut node = Node::new(lossy(start.name().as_ref()).to_ascii_lowercase());
    for attr in start.attributes().with_checks(false).flatten() {
        let key = lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(Cow::into_owned)
            .unwrap_or_else(|_| unescape_lenient(&lossy(&attr.value)));
        node.attrs.push((key, value));
    }
    node
}

fn current(stack: &mut [Node]) -> &mut Node {
    // The synthetic root is never popped while parsing.
    let last = stack.len() - 1;
    &mut stack[last]
}

fn attach(stack: &mut [Node], node: Node) {
    current(stack).children.push(Content::Element(node));
}

/// Close the innermost open element named `name`, implicitly closing any
/// elements opened after it. Unmatched end tags are dropped.
fn close(stack: &mut Vec<Node>, name: &str) {
    let Some(pos) = stack.iter().rposition(|n| n.name == name) else {
        return;
    };
    if pos == 0 {
        return;
    }
    while stack.len() > pos {
        if let Some(node) = stack.pop() {
            attach(stack, node);
        }
    }
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Resolve what can be resolved and keep unknown references verbatim.
fn unescape_lenient(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        match resolve_reference(entity) {
            Some(resolved) => out.push_str(&resolved),
            None => out.push_str(&tail[..=semi]),
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}

fn resolve_reference(entity: &str) -> Option<String> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let predefined = match entity {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        other => resolve_entity(other)?,
    };
    Some(predefined.to_string())
}

fn resolve_entity(entity: &str) -> Option<&'static str> {
    let resolved = match entity {
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "minus" => "-",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "times" => "\u{d7}",
        "deg" => "\u{b0}",
        "plusmn" => "\u{b1}",
        "micro" => "\u{b5}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        _ => return None,
    };
    Some(resolved)
}
