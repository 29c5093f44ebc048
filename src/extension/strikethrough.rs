//! `~~deleted~~` text.

use std::sync::Arc;

use crate::ast::{Delimiter, Document, Kind, KindRegistry, NodeData, NodeId, NodeType};
use crate::config::OutputFormat;
use crate::error::ConfigError;
use crate::parser::inline_parser::scan_delimiter;
use crate::parser::{Context, DelimiterProcessor, InlineParser, ParserBuilder};
use crate::renderer::{NodeRenderer, RenderContext, RenderError, RendererBuilder, WalkStatus};
use crate::text::Reader;

use super::Extension;

pub const KIND_NAME: &str = "Strikethrough";

struct TildeProcessor {
    kind: Kind,
}

impl DelimiterProcessor for TildeProcessor {
    fn is_delimiter(&self, b: u8) -> bool {
        b == b'~'
    }

    fn can_open_closer(&self, opener: &Delimiter, closer: &Delimiter) -> bool {
        opener.char == closer.char
    }

    fn on_match(&self, doc: &mut Document, _consumes: usize, _marker: u8) -> NodeId {
        doc.new_node(self.kind, NodeData::Extension)
    }
}

pub struct StrikethroughParser {
    processor: Arc<dyn DelimiterProcessor>,
}

impl StrikethroughParser {
    pub fn new(kind: Kind) -> Self {
        Self {
            processor: Arc::new(TildeProcessor { kind }),
        }
    }
}

impl InlineParser for StrikethroughParser {
    fn trigger(&self) -> &[u8] {
        b"~"
    }

    fn parse(&self, doc: &mut Document, _parent: NodeId, block: &mut Reader<'_>, pc: &mut Context) -> Option<NodeId> {
        if block.prev_char() == Some('~') {
            return None;
        }
        let delimiter = scan_delimiter(block, self.processor.as_ref())?;
        if delimiter.original_length > 2 {
            return None;
        }
        block.advance(delimiter.original_length);
        let node = doc.new_node(Kind::DELIMITER, NodeData::Delimiter(delimiter));
        pc.push_delimiter(node, Arc::clone(&self.processor));
        Some(node)
    }
}

struct StrikethroughRenderer {
    format: OutputFormat,
}

impl NodeRenderer for StrikethroughRenderer {
    fn kinds(&self, registry: &KindRegistry) -> Result<Vec<Kind>, ConfigError> {
        Ok(vec![registry.require(KIND_NAME)?])
    }

    fn render(&self, ctx: &mut RenderContext<'_>, _node: NodeId, entering: bool) -> Result<WalkStatus, RenderError> {
        let markup = match (self.format, entering) {
            (OutputFormat::Html, true) => "<del>",
            (OutputFormat::Html, false) => "</del>",
            (OutputFormat::Markdown, _) => "~~",
        };
        ctx.write(markup)?;
        Ok(WalkStatus::Continue)
    }
}

pub struct Strikethrough;

impl Extension for Strikethrough {
    fn name(&self) -> &'static str {
        "Strikethrough"
    }

    fn extend_parser(&self, builder: &mut ParserBuilder) -> Result<(), ConfigError> {
        let kind = builder.register_kind(KIND_NAME, NodeType::Inline)?;
        builder.add_inline_parser(StrikethroughParser::new(kind), 500);
        Ok(())
    }

    fn extend_renderer(&self, builder: &mut RendererBuilder) -> Result<(), ConfigError> {
        let format = builder.format();
        builder.add_node_renderer(StrikethroughRenderer { format }, 500);
        Ok(())
    }
}
