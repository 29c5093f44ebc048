//! Paragraphs: the fallback for any non-blank line no other parser claims.

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::{BlockParser, Context, State};
use crate::text::Reader;

pub struct ParagraphParser;

impl BlockParser for ParagraphParser {
    fn open(
        &self,
        doc: &mut Document,
        _parent: NodeId,
        reader: &mut Reader<'_>,
        _pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        let segment = reader.peek_line_segment()?;
        let segment = segment.trim_left_space(reader.source());
        if segment.is_blank(reader.source()) {
            return None;
        }
        let node = doc.new_node(Kind::PARAGRAPH, NodeData::Paragraph);
        doc.lines_mut(node).push(segment);
        Some((node, State::NoChildren))
    }

    fn continue_block(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) -> State {
        let Some(segment) = reader.peek_line_segment() else {
            return State::Close;
        };
        if segment.is_blank(reader.source()) {
            return State::Close;
        }
        doc.lines_mut(node).push(segment);
        State::NoChildren
    }

    /// Strips indentation from every line and trailing whitespace from the
    /// last one. A paragraph left without lines is removed.
    fn close(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) {
        let source = reader.source();
        let mut lines = doc.lines(node).clone();
        if lines.is_empty() {
            if let Some(parent) = doc.parent(node) {
                doc.remove_child(parent, node);
            }
            return;
        }
        for i in 0..lines.len() {
            lines.set(i, lines.at(i).trim_left_space(source));
        }
        let last = lines.len() - 1;
        lines.set(last, lines.at(last).trim_right_space(source));
        doc.set_lines(node, lines);
    }

    fn can_interrupt_paragraph(&self) -> bool {
        false
    }

    fn can_accept_indented_line(&self) -> bool {
        false
    }
}
