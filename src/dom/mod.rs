//! In-memory document tree for the visual editing surface
//!
//! The visual representation of a post is a small HTML-like tree: a root
//! fragment holding elements and text leaves. Nodes live in an arena and are
//! addressed by [`NodeId`]; detaching a node keeps it alive in the arena so
//! callers can re-insert it elsewhere (the same way DOM nodes survive removal).
//!
//! # Modules
//! - `parse.rs` - HTML tokenizing into a tree (html5ever tokenizer)
//! - `range.rs` - boundaries, ranges, extraction and splitting

mod parse;
mod range;

pub use range::{expand_to_word, Boundary, DomRange, Extracted, RangeError};

use std::fmt::Write as _;

// ─────────────────────────────────────────────────────────────────────────────
// Node Types
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a node inside a [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element with a lowercase tag name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The editable surface itself
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Void elements that still count as visible content.
const CONTENT_VOIDS: &[&str] = &["img", "hr", "input", "embed", "video", "audio", "iframe"];

/// Check whether a tag is a void element.
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

// ─────────────────────────────────────────────────────────────────────────────
// Dom
// ─────────────────────────────────────────────────────────────────────────────

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create an empty document holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse an HTML fragment into a new document.
    pub fn parse(html: &str) -> Self {
        let mut dom = Self::new();
        let root = dom.root();
        parse::parse_into(&mut dom, root, html);
        dom
    }

    /// The root node of the surface.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Creation and inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(Element::new(tag)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    /// Tag name if the node is an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(el) => Some(el.tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Text(_))
    }

    /// Check whether the node is an element with one of the given tags.
    pub fn has_tag(&self, id: NodeId, tags: &[&str]) -> bool {
        self.tag(id).is_some_and(|tag| tags.contains(&tag))
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Replace the text of a text node. Does nothing for other nodes.
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        if let NodeData::Text(text) = &mut self.node_mut(id).data {
            *text = value.to_string();
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(el) => el
                .attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).data {
            NodeData::Element(el) => &el.attrs,
            _ => &[],
        }
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            let name = name.to_ascii_lowercase();
            match el.attrs.iter_mut().find(|(key, _)| *key == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => el.attrs.push((name, value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        self.retain_attrs(id, |key, _| key != name);
    }

    /// Keep only attributes accepted by the predicate.
    pub fn retain_attrs<F>(&mut self, id: NodeId, mut keep: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            el.attrs.retain(|(key, value)| keep(key, value));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    /// Position of a node among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Length used by range offsets: bytes for text, child count otherwise.
    pub fn node_len(&self, id: NodeId) -> usize {
        match &self.node(id).data {
            NodeData::Text(text) => text.len(),
            _ => self.child_count(id),
        }
    }

    /// Ancestors from the parent upwards, ending with the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// Check whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).any(|node| node == self.root())
    }

    /// Check whether `ancestor` contains `id` (inclusive).
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|node| node == ancestor)
    }

    /// Nearest inclusive ancestor element whose tag is in `tags`.
    pub fn closest(&self, id: NodeId, tags: &[&str]) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&node| self.has_tag(node, tags))
    }

    /// Deepest node containing both `a` and `b`.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        std::iter::once(a)
            .chain(self.ancestors(a))
            .find(|&node| self.contains(node, b))
    }

    /// Descendants of a node in document order, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of all text leaves under a node.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Child-index path from the root, used for document-order comparisons.
    pub(crate) fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_in_parent(current).unwrap_or(0));
            current = parent;
        }
        path.reverse();
        path
    }

    /// Check whether the surface shows nothing: no visible text and no
    /// content-bearing void elements.
    pub fn is_visibly_empty(&self, id: NodeId) -> bool {
        self.descendants(id).into_iter().all(|node| match self.data(node) {
            NodeData::Text(text) => text.chars().all(|c| c.is_whitespace()),
            NodeData::Element(el) => !CONTENT_VOIDS.contains(&el.tag.as_str()),
            NodeData::Root => true,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Remove a node from its parent. The node stays valid for re-insertion.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&child| child != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Insert `child` at `index` among `parent`'s children, detaching it first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.node_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.child_count(parent);
        self.insert_child(parent, index, child);
    }

    /// Insert `child` directly after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_child(parent, index + 1, child);
        }
    }

    /// Insert `child` directly before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_child(parent, index, child);
        }
    }

    /// Detach every child of a node.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.node_mut(id).children) {
            self.node_mut(child).parent = None;
        }
    }

    /// Replace an element by its children (unwrap).
    pub fn unwrap_node(&mut self, id: NodeId) {
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            return;
        };
        let children = self.children(id).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + offset, child);
        }
        self.detach(id);
    }

    /// Copy of a node without children or parent.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let data = self.node(id).data.clone();
        self.alloc(data)
    }

    /// Split a text node at a byte offset, DOM `splitText` style.
    ///
    /// The original node keeps the head; the returned node holds the tail and
    /// is inserted right after the original when it has a parent.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        let offset = crate::string_utils::floor_char_boundary(text, offset);
        let tail = text[offset..].to_string();
        let head = text[..offset].to_string();
        self.set_text(id, &head);
        let tail_node = self.create_text(&tail);
        self.insert_after(id, tail_node);
        Some(tail_node)
    }

    /// Replace a node's children with the parsed content of `html`.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.clear_children(id);
        parse::parse_into(self, id, html);
    }

    /// Replace the whole surface with another document's content.
    pub fn replace_with(&mut self, other: Dom) {
        *self = other;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Serialization
    // ─────────────────────────────────────────────────────────────────────────

    /// HTML of the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    /// HTML of the node itself including its tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// HTML of the whole surface.
    pub fn html(&self) -> String {
        self.inner_html(self.root())
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Root => {
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
            }
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (key, value) in &el.attrs {
                    let _ = write!(out, " {}=\"{}\"", key, escape_attr(value));
                }
                out.push('>');
                if is_void(&el.tag) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }
}

/// Escape text for HTML output.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for double-quoted HTML output.
pub fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let dom = Dom::parse("<p>Hello <strong>world</strong></p>");
        assert_eq!(dom.html(), "<p>Hello <strong>world</strong></p>");
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let dom = Dom::parse("<p>a<br/>b</p><hr>");
        assert_eq!(dom.html(), "<p>a<br>b</p><hr>");
    }

    #[test]
    fn test_text_content() {
        let dom = Dom::parse("<p>One <em>two</em> three</p>");
        assert_eq!(dom.text_content(dom.root()), "One two three");
    }

    #[test]
    fn test_entities_are_decoded_and_reescaped() {
        let dom = Dom::parse("<p>a &amp; b &lt;c&gt;&nbsp;</p>");
        let p = dom.children(dom.root())[0];
        assert_eq!(dom.text_content(p), "a & b <c>\u{a0}");
        assert_eq!(dom.html(), "<p>a &amp; b &lt;c&gt;&nbsp;</p>");
    }

    #[test]
    fn test_split_text_keeps_head_in_place() {
        let mut dom = Dom::parse("<p>Hello world</p>");
        let p = dom.children(dom.root())[0];
        let text = dom.children(p)[0];
        let tail = dom.split_text(text, 5).unwrap();
        assert_eq!(dom.text(text), Some("Hello"));
        assert_eq!(dom.text(tail), Some(" world"));
        assert_eq!(dom.children(p), &[text, tail]);
    }

    #[test]
    fn test_split_text_mid_char_is_safe() {
        let mut dom = Dom::parse("<p>på</p>");
        let p = dom.children(dom.root())[0];
        let text = dom.children(p)[0];
        // byte 2 falls inside 'å'
        let tail = dom.split_text(text, 2).unwrap();
        assert_eq!(dom.text(text), Some("p"));
        assert_eq!(dom.text(tail), Some("å"));
    }

    #[test]
    fn test_closest_and_attachment() {
        let mut dom = Dom::parse("<p><strong><em>x</em></strong></p>");
        let p = dom.children(dom.root())[0];
        let strong = dom.children(p)[0];
        let em = dom.children(strong)[0];
        let text = dom.children(em)[0];
        assert_eq!(dom.closest(text, &["strong", "b"]), Some(strong));
        assert_eq!(dom.closest(text, &["u"]), None);
        assert!(dom.is_attached(text));
        dom.detach(strong);
        assert!(!dom.is_attached(text));
    }

    #[test]
    fn test_unwrap_node() {
        let mut dom = Dom::parse("<p>a<strong>b<em>c</em></strong>d</p>");
        let p = dom.children(dom.root())[0];
        let strong = dom.children(p)[1];
        dom.unwrap_node(strong);
        assert_eq!(dom.html(), "<p>ab<em>c</em>d</p>");
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut dom = Dom::parse(r#"<a href="x" title="t">l</a>"#);
        let a = dom.children(dom.root())[0];
        dom.set_attr(a, "href", "y");
        assert_eq!(dom.html(), r#"<a href="y" title="t">l</a>"#);
    }

    #[test]
    fn test_visibly_empty() {
        assert!(Dom::parse("<p><br></p>").is_visibly_empty(NodeId(0)));
        assert!(Dom::parse("<p>&nbsp;</p>").is_visibly_empty(NodeId(0)));
        assert!(!Dom::parse("<p>x</p>").is_visibly_empty(NodeId(0)));
        assert!(!Dom::parse(r#"<p><img src="a.png"></p>"#).is_visibly_empty(NodeId(0)));
    }
}
