//! Block and inline parsing.
//!
//! A [`ParserBuilder`] collects block parsers, inline parsers, paragraph
//! transformers and tree transformers, each tagged with a priority (lower
//! runs first). [`ParserBuilder::build`] sorts every category, ties kept in
//! registration order, and freezes the result into a [`Parser`] that can be
//! shared between threads. Each call to [`Parser::parse`] runs three passes
//! over one document:
//!
//! 1. block structure, line by line, with paragraph transformers applied as
//!    paragraphs close;
//! 2. inline content of every leaf block, once the reference table is
//!    complete;
//! 3. tree transformers.

pub mod attributes;
pub mod block_parser;
pub mod heading_ids;
pub mod inline_parser;
pub mod reference_definitions;
pub mod references;

use std::sync::Arc;

use crate::ast::{Document, Kind, KindRegistry, NodeId, NodeType};
use crate::config::{Config, ParserConfig};
use crate::error::ConfigError;
use crate::text::Reader;

pub use block_parser::State;
pub use inline_parser::{DelimiterProcessor, LinkOpener};
pub use references::{Reference, ReferenceTable};

use block_parser::OpenBlock;
use inline_parser::DelimiterEntry;

/// Recognizes one kind of block construct at the start of a line.
pub trait BlockParser: Send + Sync {
    /// Bytes that may start this construct. An empty slice means the parser
    /// is tried on every non-blank line.
    fn trigger(&self) -> &[u8] {
        &[]
    }

    /// Tries to open a block at the reader's position. On success the new
    /// node is returned unattached; the driver appends it to `parent`.
    fn open(
        &self,
        doc: &mut Document,
        parent: NodeId,
        reader: &mut Reader<'_>,
        pc: &mut Context,
    ) -> Option<(NodeId, State)>;

    /// Decides whether the current line continues `node`, consuming any
    /// container prefix.
    fn continue_block(
        &self,
        doc: &mut Document,
        node: NodeId,
        reader: &mut Reader<'_>,
        pc: &mut Context,
    ) -> State;

    fn close(&self, _doc: &mut Document, _node: NodeId, _reader: &mut Reader<'_>, _pc: &mut Context) {}

    fn can_interrupt_paragraph(&self) -> bool;

    fn can_accept_indented_line(&self) -> bool;
}

/// Recognizes one kind of inline construct at a trigger byte.
pub trait InlineParser: Send + Sync {
    fn trigger(&self) -> &[u8];

    /// Tries to parse at the reader's position, which holds a trigger byte.
    /// Returns the node to append to `parent`, or `None` to let the next
    /// parser try; the driver restores the reader position on `None`.
    fn parse(
        &self,
        doc: &mut Document,
        parent: NodeId,
        block: &mut Reader<'_>,
        pc: &mut Context,
    ) -> Option<NodeId>;

    /// Called once the whole block has been scanned.
    fn close_block(&self, _doc: &mut Document, _parent: NodeId, _pc: &mut Context) {}
}

/// Rewrites a paragraph as it closes, possibly removing it.
pub trait ParagraphTransformer: Send + Sync {
    fn transform(&self, doc: &mut Document, paragraph: NodeId, source: &str, pc: &mut Context);
}

/// Rewrites the finished tree.
pub trait AstTransformer: Send + Sync {
    fn transform(&self, doc: &mut Document, source: &str, pc: &mut Context);
}

/// A registry entry and its priority.
#[derive(Clone)]
pub struct Prioritized<T> {
    pub value: T,
    pub priority: i32,
}

impl<T> Prioritized<T> {
    pub fn new(value: T, priority: i32) -> Self {
        Self { value, priority }
    }
}

/// Stable sort, lower priority first.
pub fn sort_prioritized<T>(items: &mut [Prioritized<T>]) {
    items.sort_by_key(|item| item.priority);
}

/// Per-document parse state shared by the parsers of one [`Parser::parse`]
/// call.
pub struct Context {
    references: ReferenceTable,
    pub(crate) opened: Vec<OpenBlock>,
    /// Set by a list item that found a sibling marker, so the list parser
    /// does not open a nested list for it.
    pub(crate) skip_list_parser: bool,
    pub(crate) empty_list_item_with_blank_lines: bool,
    /// The paragraph a setext heading underline is about to absorb.
    pub(crate) temporary_paragraph: Option<NodeId>,
    pub(crate) delimiters: Vec<DelimiterEntry>,
    pub(crate) link_openers: Vec<LinkOpener>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            references: ReferenceTable::new(),
            opened: Vec::new(),
            skip_list_parser: false,
            empty_list_item_with_blank_lines: false,
            temporary_paragraph: None,
            delimiters: Vec::new(),
            link_openers: Vec::new(),
        }
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Registers a definition; the first definition of a label wins.
    pub fn add_reference(&mut self, reference: Reference) -> bool {
        self.references.add(reference)
    }

    pub fn reference(&self, label: &str) -> Option<&Reference> {
        self.references.get(label)
    }

    /// The innermost block still open, if any.
    pub fn last_opened_block(&self) -> Option<NodeId> {
        self.opened.last().map(|block| block.node)
    }

    /// Registers a delimiter node for resolution when the block or an
    /// enclosing link closes.
    pub fn push_delimiter(&mut self, node: NodeId, processor: Arc<dyn DelimiterProcessor>) {
        self.delimiters.push(DelimiterEntry { node, processor });
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects parsers and kinds before freezing them into a [`Parser`].
pub struct ParserBuilder {
    kinds: KindRegistry,
    block_parsers: Vec<Prioritized<Arc<dyn BlockParser>>>,
    inline_parsers: Vec<Prioritized<Arc<dyn InlineParser>>>,
    paragraph_transformers: Vec<Prioritized<Arc<dyn ParagraphTransformer>>>,
    ast_transformers: Vec<Prioritized<Arc<dyn AstTransformer>>>,
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserBuilder {
    /// A builder with the built-in kinds and no parsers.
    pub fn new() -> Self {
        Self {
            kinds: KindRegistry::new(),
            block_parsers: Vec::new(),
            inline_parsers: Vec::new(),
            paragraph_transformers: Vec::new(),
            ast_transformers: Vec::new(),
        }
    }

    /// A builder with every CommonMark parser registered.
    pub fn with_defaults(config: &ParserConfig) -> Self {
        let mut builder = Self::new();
        block_parser::register_defaults(&mut builder, config);
        inline_parser::register_defaults(&mut builder);
        builder.add_paragraph_transformer(reference_definitions::LinkReferenceTransformer, 100);
        if config.auto_heading_id {
            builder.add_ast_transformer(heading_ids::HeadingIdTransformer, 100);
        }
        builder
    }

    /// The default parsers plus those of every extension `config` enables.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::with_defaults(&config.parser);
        for extension in crate::extension::from_config(&config.extensions) {
            if let Err(err) = extension.extend_parser(&mut builder) {
                log::warn!("Skipping extension {}: {}", extension.name(), err);
            }
        }
        builder
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    pub fn register_kind(&mut self, name: &'static str, node_type: NodeType) -> Result<Kind, ConfigError> {
        self.kinds.register(name, node_type)
    }

    pub fn add_block_parser(&mut self, parser: impl BlockParser + 'static, priority: i32) -> &mut Self {
        self.block_parsers.push(Prioritized::new(Arc::new(parser), priority));
        self
    }

    pub fn add_inline_parser(&mut self, parser: impl InlineParser + 'static, priority: i32) -> &mut Self {
        self.inline_parsers.push(Prioritized::new(Arc::new(parser), priority));
        self
    }

    pub fn add_paragraph_transformer(
        &mut self,
        transformer: impl ParagraphTransformer + 'static,
        priority: i32,
    ) -> &mut Self {
        self.paragraph_transformers
            .push(Prioritized::new(Arc::new(transformer), priority));
        self
    }

    pub fn add_ast_transformer(&mut self, transformer: impl AstTransformer + 'static, priority: i32) -> &mut Self {
        self.ast_transformers
            .push(Prioritized::new(Arc::new(transformer), priority));
        self
    }

    pub fn build(mut self) -> Parser {
        sort_prioritized(&mut self.block_parsers);
        sort_prioritized(&mut self.inline_parsers);
        sort_prioritized(&mut self.paragraph_transformers);
        sort_prioritized(&mut self.ast_transformers);

        let block_parsers: Vec<_> = self.block_parsers.into_iter().map(|p| p.value).collect();
        let inline_parsers: Vec<_> = self.inline_parsers.into_iter().map(|p| p.value).collect();
        let block_dispatch = dispatch_table(block_parsers.iter().map(|p| p.trigger()));
        let inline_dispatch = dispatch_table(inline_parsers.iter().map(|p| p.trigger()));

        log::debug!(
            "Built parser: {} block parsers, {} inline parsers, {} paragraph transformers, {} tree transformers",
            block_parsers.len(),
            inline_parsers.len(),
            self.paragraph_transformers.len(),
            self.ast_transformers.len()
        );

        Parser {
            kinds: Arc::new(self.kinds),
            block_parsers,
            block_dispatch,
            inline_parsers,
            inline_dispatch,
            paragraph_transformers: self.paragraph_transformers.into_iter().map(|p| p.value).collect(),
            ast_transformers: self.ast_transformers.into_iter().map(|p| p.value).collect(),
        }
    }
}

/// For each byte, the indices of the parsers triggered by it merged with the
/// trigger-less ones, in priority order.
fn dispatch_table<'a>(triggers: impl Iterator<Item = &'a [u8]>) -> Vec<Vec<usize>> {
    let mut table = vec![Vec::new(); 256];
    for (index, trigger) in triggers.enumerate() {
        if trigger.is_empty() {
            for entry in table.iter_mut() {
                entry.push(index);
            }
        } else {
            for &b in trigger {
                let entry = &mut table[b as usize];
                if entry.last() != Some(&index) {
                    entry.push(index);
                }
            }
        }
    }
    table
}

/// A frozen parser pipeline.
pub struct Parser {
    kinds: Arc<KindRegistry>,
    block_parsers: Vec<Arc<dyn BlockParser>>,
    block_dispatch: Vec<Vec<usize>>,
    inline_parsers: Vec<Arc<dyn InlineParser>>,
    inline_dispatch: Vec<Vec<usize>>,
    paragraph_transformers: Vec<Arc<dyn ParagraphTransformer>>,
    ast_transformers: Vec<Arc<dyn AstTransformer>>,
}

impl Parser {
    pub fn kinds(&self) -> &Arc<KindRegistry> {
        &self.kinds
    }

    /// Parses `source` into a document tree. Never fails: anything that is
    /// not a recognized construct becomes text.
    pub fn parse(&self, source: &str) -> Document {
        self.parse_with_context(source).0
    }

    /// Like [`parse`](Self::parse), also returning the parse state, whose
    /// reference table holds every definition found.
    pub fn parse_with_context(&self, source: &str) -> (Document, Context) {
        let mut doc = Document::new(Arc::clone(&self.kinds));
        let mut pc = Context::new();
        self.parse_blocks(&mut doc, source, &mut pc);
        log::debug!("Block pass done, {} reference definitions", pc.references().len());
        self.parse_inline_blocks(&mut doc, source, &mut pc);
        for transformer in &self.ast_transformers {
            transformer.transform(&mut doc, source, &mut pc);
        }
        (doc, pc)
    }

    /// Runs the paragraph transformers over `paragraph`. Returns `true` if
    /// one of them removed it from the tree.
    fn transform_paragraph(&self, doc: &mut Document, paragraph: NodeId, source: &str, pc: &mut Context) -> bool {
        for transformer in &self.paragraph_transformers {
            transformer.transform(doc, paragraph, source, pc);
            if doc.parent(paragraph).is_none() {
                return true;
            }
        }
        false
    }
}
