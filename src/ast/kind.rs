//! Node kinds and the registry that hands them out.

use crate::error::ConfigError;

/// Stable identity of a node type, used to key renderers and structural
/// assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kind(u16);

/// Whether nodes of a kind sit at block or inline level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Block,
    Inline,
}

impl Kind {
    pub const DOCUMENT: Kind = Kind(0);
    pub const PARAGRAPH: Kind = Kind(1);
    pub const TEXT_BLOCK: Kind = Kind(2); // paragraph of a tight list item
    pub const HEADING: Kind = Kind(3);
    pub const THEMATIC_BREAK: Kind = Kind(4);
    pub const CODE_BLOCK: Kind = Kind(5); // indented
    pub const FENCED_CODE_BLOCK: Kind = Kind(6);
    pub const BLOCKQUOTE: Kind = Kind(7);
    pub const LIST: Kind = Kind(8);
    pub const LIST_ITEM: Kind = Kind(9);
    pub const HTML_BLOCK: Kind = Kind(10);
    pub const LINK_REFERENCE_DEFINITION: Kind = Kind(11);
    pub const TEXT: Kind = Kind(12);
    pub const STRING: Kind = Kind(13);
    pub const CODE_SPAN: Kind = Kind(14);
    pub const EMPHASIS: Kind = Kind(15);
    pub const LINK: Kind = Kind(16);
    pub const IMAGE: Kind = Kind(17);
    pub const AUTO_LINK: Kind = Kind(18);
    pub const RAW_HTML: Kind = Kind(19);
    pub const DELIMITER: Kind = Kind(20); // transient, resolved before parsing ends

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

const BUILTIN_KINDS: &[(&str, NodeType)] = &[
    ("Document", NodeType::Document),
    ("Paragraph", NodeType::Block),
    ("TextBlock", NodeType::Block),
    ("Heading", NodeType::Block),
    ("ThematicBreak", NodeType::Block),
    ("CodeBlock", NodeType::Block),
    ("FencedCodeBlock", NodeType::Block),
    ("Blockquote", NodeType::Block),
    ("List", NodeType::Block),
    ("ListItem", NodeType::Block),
    ("HtmlBlock", NodeType::Block),
    ("LinkReferenceDefinition", NodeType::Block),
    ("Text", NodeType::Inline),
    ("String", NodeType::Inline),
    ("CodeSpan", NodeType::Inline),
    ("Emphasis", NodeType::Inline),
    ("Link", NodeType::Inline),
    ("Image", NodeType::Inline),
    ("AutoLink", NodeType::Inline),
    ("RawHtml", NodeType::Inline),
    ("Delimiter", NodeType::Inline),
];

/// Assigns kind identities. Built-in kinds occupy fixed slots; extension kinds
/// are appended in registration order. Each name may be registered once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRegistry {
    entries: Vec<(&'static str, NodeType)>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self {
            entries: BUILTIN_KINDS.to_vec(),
        }
    }
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, node_type: NodeType) -> Result<Kind, ConfigError> {
        if self.lookup(name).is_some() {
            return Err(ConfigError::DuplicateKind(name.to_string()));
        }
        let kind = Kind(self.entries.len() as u16);
        self.entries.push((name, node_type));
        log::debug!("Registered node kind {} as {:?}", name, kind);
        Ok(kind)
    }

    pub fn lookup(&self, name: &str) -> Option<Kind> {
        self.entries
            .iter()
            .position(|(n, _)| *n == name)
            .map(|i| Kind(i as u16))
    }

    /// Like [`lookup`](Self::lookup) but reports a missing kind as an error.
    pub fn require(&self, name: &str) -> Result<Kind, ConfigError> {
        self.lookup(name)
            .ok_or_else(|| ConfigError::UnknownKind(name.to_string()))
    }

    pub fn name(&self, kind: Kind) -> &'static str {
        self.entries.get(kind.index()).map_or("<unknown>", |(n, _)| n)
    }

    pub fn node_type(&self, kind: Kind) -> NodeType {
        self.entries
            .get(kind.index())
            .map_or(NodeType::Inline, |(_, t)| *t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Kind, &'static str)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (Kind(i as u16), *name))
    }
}
