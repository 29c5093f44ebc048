//! Arena-allocated document tree.
//!
//! Nodes live in a single vector owned by [`Document`] and link to their
//! parent, children and siblings by [`NodeId`] index. Detached nodes stay in
//! the arena but are unreachable from the root.

mod data;
mod kind;

use std::sync::Arc;

pub use data::{
    Attributes, AutoLinkType, Delimiter, HtmlBlockType, LinkData, NodeData, ReferenceType,
};
pub use kind::{Kind, KindRegistry, NodeType};

use crate::text::Segments;
use crate::utils::unescape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeRecord {
    kind: Kind,
    data: NodeData,
    lines: Segments,
    attributes: Attributes,
    blank_previous_lines: bool,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl NodeRecord {
    fn new(kind: Kind, data: NodeData) -> Self {
        Self {
            kind,
            data,
            lines: Segments::new(),
            attributes: Attributes::default(),
            blank_previous_lines: false,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// A parsed document: the node arena plus the kind registry its kinds were
/// drawn from.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeRecord>,
    kinds: Arc<KindRegistry>,
}

impl Document {
    pub fn new(kinds: Arc<KindRegistry>) -> Self {
        Self {
            nodes: vec![NodeRecord::new(Kind::DOCUMENT, NodeData::Document)],
            kinds,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    pub fn new_node(&mut self, kind: Kind, data: NodeData) -> NodeId {
        self.nodes.push(NodeRecord::new(kind, data));
        NodeId(self.nodes.len() - 1)
    }

    pub fn kind(&self, id: NodeId) -> Kind {
        self.nodes[id.0].kind
    }

    pub fn kind_name(&self, id: NodeId) -> &'static str {
        self.kinds.name(self.kind(id))
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        self.kinds.node_type(self.kind(id)) == NodeType::Block
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0].data
    }

    pub fn lines(&self, id: NodeId) -> &Segments {
        &self.nodes[id.0].lines
    }

    pub fn lines_mut(&mut self, id: NodeId) -> &mut Segments {
        &mut self.nodes[id.0].lines
    }

    pub fn set_lines(&mut self, id: NodeId, lines: Segments) {
        self.nodes[id.0].lines = lines;
    }

    pub fn attributes(&self, id: NodeId) -> &Attributes {
        &self.nodes[id.0].attributes
    }

    pub fn attributes_mut(&mut self, id: NodeId) -> &mut Attributes {
        &mut self.nodes[id.0].attributes
    }

    /// Whether a blank line preceded this block in the source.
    pub fn blank_previous_lines(&self, id: NodeId) -> bool {
        self.nodes[id.0].blank_previous_lines
    }

    pub fn set_blank_previous_lines(&mut self, id: NodeId, value: bool) {
        self.nodes[id.0].blank_previous_lines = value;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev_sibling
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.first_child(id).is_some()
    }

    /// Unlinks `child` from its parent and siblings.
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes[child.0].parent else {
            return;
        };
        let prev = self.nodes[child.0].prev_sibling;
        let next = self.nodes[child.0].next_sibling;
        match prev {
            Some(p) => self.nodes[p.0].next_sibling = next,
            None => self.nodes[parent.0].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n.0].prev_sibling = prev,
            None => self.nodes[parent.0].last_child = prev,
        }
        let record = &mut self.nodes[child.0];
        record.parent = None;
        record.prev_sibling = None;
        record.next_sibling = None;
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.nodes[parent.0].last_child;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].prev_sibling = last;
        match last {
            Some(l) => self.nodes[l.0].next_sibling = Some(child),
            None => self.nodes[parent.0].first_child = Some(child),
        }
        self.nodes[parent.0].last_child = Some(child);
    }

    /// Inserts `child` before `reference`, or appends it when `reference` is
    /// `None`.
    pub fn insert_before(&mut self, parent: NodeId, reference: Option<NodeId>, child: NodeId) {
        let Some(reference) = reference else {
            self.append_child(parent, child);
            return;
        };
        self.detach(child);
        let prev = self.nodes[reference.0].prev_sibling;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].prev_sibling = prev;
        self.nodes[child.0].next_sibling = Some(reference);
        self.nodes[reference.0].prev_sibling = Some(child);
        match prev {
            Some(p) => self.nodes[p.0].next_sibling = Some(child),
            None => self.nodes[parent.0].first_child = Some(child),
        }
    }

    pub fn insert_after(&mut self, parent: NodeId, reference: NodeId, child: NodeId) {
        let next = self.next_sibling(reference);
        self.insert_before(parent, next, child);
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) == Some(parent) {
            self.detach(child);
        }
    }

    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        self.insert_before(parent, Some(old), new);
        self.remove_child(parent, old);
    }

    /// All nodes under `id` in document order, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children: Vec<_> = self.children(node).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Plain text of the inline content under `id`, escapes resolved.
    pub fn text_content(&self, id: NodeId, source: &str) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            match self.data(node) {
                NodeData::Text {
                    segment,
                    soft_break,
                    raw,
                    ..
                } => {
                    let value = segment.value(source);
                    if *raw {
                        out.push_str(&value);
                    } else {
                        out.push_str(&unescape(&value));
                    }
                    if *soft_break {
                        out.push('\n');
                    }
                }
                NodeData::String { value, .. } => out.push_str(value),
                NodeData::AutoLink { value, .. } => out.push_str(value.raw(source)),
                _ => {}
            }
        }
        out
    }

    /// An indented, one-node-per-line rendering of the tree for debugging and
    /// snapshot tests.
    pub fn dump(&self, source: &str) -> String {
        let mut out = String::new();
        self.dump_node(self.root(), source, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, source: &str, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.kind_name(id));
        let fields = self.describe(id, source);
        if !fields.is_empty() {
            out.push(' ');
            out.push_str(&fields);
        }
        let attrs = self.attributes(id);
        if !attrs.is_empty() {
            let rendered: Vec<_> = attrs.iter().map(|(k, v)| format!("{}={:?}", k, v)).collect();
            out.push_str(&format!(" {{{}}}", rendered.join(" ")));
        }
        out.push('\n');
        for child in self.children(id) {
            self.dump_node(child, source, depth + 1, out);
        }
    }

    fn describe(&self, id: NodeId, source: &str) -> String {
        match self.data(id) {
            NodeData::Heading { level } => format!("level={}", level),
            NodeData::FencedCodeBlock { fence, info, .. } => format!(
                "fence={:?} info={:?} lines={:?}",
                *fence as char,
                info.map(|s| s.raw(source)),
                self.lines(id).block_value(source)
            ),
            NodeData::CodeBlock => format!("lines={:?}", self.lines(id).block_value(source)),
            NodeData::HtmlBlock { html_type, .. } => {
                format!("type={:?} lines={:?}", html_type, self.lines(id).block_value(source))
            }
            NodeData::List {
                marker,
                start,
                tight,
            } => format!("marker={:?} start={:?} tight={}", *marker as char, start, tight),
            NodeData::ListItem { offset } => format!("offset={}", offset),
            NodeData::LinkReferenceDefinition {
                label,
                destination,
                title,
            } => format!("label={:?} destination={:?} title={:?}", label, destination, title),
            NodeData::Text {
                segment,
                soft_break,
                hard_break,
                raw,
            } => {
                let mut s = format!("{:?}", segment.value(source));
                if *soft_break {
                    s.push_str(" soft");
                }
                if *hard_break {
                    s.push_str(" hard");
                }
                if *raw {
                    s.push_str(" raw");
                }
                s
            }
            NodeData::String { value, raw } => {
                if *raw {
                    format!("{:?} raw", value)
                } else {
                    format!("{:?}", value)
                }
            }
            NodeData::Emphasis { level, .. } => format!("level={}", level),
            NodeData::Link(link) | NodeData::Image(link) => format!(
                "destination={:?} title={:?} reference={:?}",
                link.destination, link.title, link.reference_type
            ),
            NodeData::AutoLink { link_type, value } => {
                format!("{:?} {:?}", link_type, value.raw(source))
            }
            NodeData::RawHtml { segments } => format!("{:?}", segments.value(source)),
            NodeData::Delimiter(d) => format!("{:?}", d.segment.raw(source)),
            _ => String::new(),
        }
    }
}

pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(Arc::new(KindRegistry::new()))
    }

    #[test]
    fn test_append_and_iterate() {
        let mut d = doc();
        let root = d.root();
        let a = d.new_node(Kind::PARAGRAPH, NodeData::Paragraph);
        let b = d.new_node(Kind::THEMATIC_BREAK, NodeData::ThematicBreak);
        d.append_child(root, a);
        d.append_child(root, b);
        assert_eq!(d.children(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(d.parent(a), Some(root));
        assert_eq!(d.next_sibling(a), Some(b));
        assert_eq!(d.prev_sibling(b), Some(a));
    }

    #[test]
    fn test_insert_before_first_child() {
        let mut d = doc();
        let root = d.root();
        let a = d.new_node(Kind::PARAGRAPH, NodeData::Paragraph);
        let b = d.new_node(Kind::PARAGRAPH, NodeData::Paragraph);
        d.append_child(root, a);
        d.insert_before(root, Some(a), b);
        assert_eq!(d.first_child(root), Some(b));
        assert_eq!(d.children(root).collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn test_remove_middle_child() {
        let mut d = doc();
        let root = d.root();
        let ids: Vec<_> = (0..3)
            .map(|_| {
                let id = d.new_node(Kind::PARAGRAPH, NodeData::Paragraph);
                d.append_child(root, id);
                id
            })
            .collect();
        d.remove_child(root, ids[1]);
        assert_eq!(d.children(root).collect::<Vec<_>>(), vec![ids[0], ids[2]]);
        assert_eq!(d.parent(ids[1]), None);
        assert_eq!(d.next_sibling(ids[0]), Some(ids[2]));
    }

    #[test]
    fn test_append_moves_between_parents() {
        let mut d = doc();
        let root = d.root();
        let quote = d.new_node(Kind::BLOCKQUOTE, NodeData::Blockquote);
        let para = d.new_node(Kind::PARAGRAPH, NodeData::Paragraph);
        d.append_child(root, quote);
        d.append_child(root, para);
        d.append_child(quote, para);
        assert_eq!(d.child_count(root), 1);
        assert_eq!(d.parent(para), Some(quote));
        assert_eq!(d.last_child(root), Some(quote));
    }

    #[test]
    fn test_replace_child() {
        let mut d = doc();
        let root = d.root();
        let a = d.new_node(Kind::PARAGRAPH, NodeData::Paragraph);
        let b = d.new_node(Kind::TEXT_BLOCK, NodeData::TextBlock);
        d.append_child(root, a);
        d.replace_child(root, a, b);
        assert_eq!(d.children(root).collect::<Vec<_>>(), vec![b]);
    }
}
