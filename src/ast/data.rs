//! Construct-specific node fields.

use crate::text::{Segment, Segments};

/// Typed payload of a node. Block nodes keep their text as the node's
/// `lines`; inline nodes address the source through segments held here.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Paragraph,
    TextBlock,
    Heading {
        level: u8,
    },
    ThematicBreak,
    CodeBlock,
    FencedCodeBlock {
        fence: u8,
        fence_len: usize,
        /// Indentation of the opening fence, removed from content lines.
        indent: usize,
        info: Option<Segment>,
    },
    Blockquote,
    List {
        /// `-`, `+` or `*` for bullet lists, `.` or `)` for ordered lists.
        marker: u8,
        /// Start number, present for ordered lists only.
        start: Option<u32>,
        tight: bool,
    },
    ListItem {
        /// Column at which the item's content starts, relative to the start
        /// of the enclosing container's content.
        offset: usize,
    },
    HtmlBlock {
        html_type: HtmlBlockType,
    },
    LinkReferenceDefinition {
        label: String,
        destination: String,
        title: Option<String>,
    },
    Text {
        segment: Segment,
        soft_break: bool,
        hard_break: bool,
        /// Raw text is rendered without resolving escapes or entities.
        raw: bool,
    },
    String {
        value: String,
        raw: bool,
    },
    CodeSpan,
    Emphasis {
        level: u8,
        marker: u8,
    },
    Link(LinkData),
    Image(LinkData),
    AutoLink {
        link_type: AutoLinkType,
        value: Segment,
    },
    RawHtml {
        segments: Segments,
    },
    Delimiter(Delimiter),
    /// A node contributed by an extension; its fields live in the attribute
    /// map.
    Extension,
}

impl NodeData {
    /// Leaf nodes whose text is taken verbatim rather than inline-parsed.
    pub fn is_raw(&self) -> bool {
        matches!(
            self,
            Self::CodeBlock
                | Self::FencedCodeBlock { .. }
                | Self::HtmlBlock { .. }
                | Self::LinkReferenceDefinition { .. }
                | Self::ThematicBreak
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    pub destination: String,
    pub title: Option<String>,
    pub reference_type: ReferenceType,
    /// The label as written, for reference-style links.
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceType {
    /// `[text](dest "title")`
    Inline,
    /// `[text][label]`
    Full,
    /// `[label][]`
    Collapsed,
    /// `[label]`
    Shortcut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoLinkType {
    Url,
    Email,
}

/// The seven HTML block start conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlBlockType {
    Raw = 1,
    Comment,
    ProcessingInstruction,
    Declaration,
    Cdata,
    Known,
    Other,
}

/// A delimiter run awaiting resolution: emphasis and strikethrough runs, and
/// the `[` or `![` opening a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter {
    pub char: u8,
    pub segment: Segment,
    pub original_length: usize,
    pub can_open: bool,
    pub can_close: bool,
}

impl Delimiter {
    pub fn length(&self) -> usize {
        self.segment.end - self.segment.start
    }
}

/// Ordered string attributes, set by the attribute syntax, auto heading IDs
/// and extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
