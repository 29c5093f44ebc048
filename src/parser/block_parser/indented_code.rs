//! Indented code blocks: lines indented by four or more columns.

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::{BlockParser, Context, State};
use crate::text::{Reader, Segment};
use crate::utils::{indent_width, is_blank};

use super::indent_position_padded;

/// The rest of the current line with four columns of indentation removed.
fn strip_indent(reader: &Reader<'_>) -> Option<Segment> {
    let line = reader.peek_line()?;
    let segment = reader.peek_line_segment()?;
    let (pos, padding) = indent_position_padded(line, reader.line_offset(), reader.padding(), 4)?;
    Some(Segment::with_padding(segment.start + pos, segment.end, padding))
}

pub struct IndentedCodeParser;

impl BlockParser for IndentedCodeParser {
    fn open(
        &self,
        doc: &mut Document,
        _parent: NodeId,
        reader: &mut Reader<'_>,
        _pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        let line = reader.peek_line()?;
        if is_blank(line) {
            return None;
        }
        let segment = strip_indent(reader)?;
        let node = doc.new_node(Kind::CODE_BLOCK, NodeData::CodeBlock);
        doc.lines_mut(node).push(segment);
        Some((node, State::NoChildren))
    }

    fn continue_block(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) -> State {
        let Some(line) = reader.peek_line() else {
            return State::Close;
        };
        if is_blank(line) {
            let segment = strip_indent(reader).or_else(|| {
                let segment = reader.peek_line_segment()?;
                let (_, bytes) = indent_width(line, reader.line_offset());
                Some(Segment::new(segment.start + bytes, segment.end))
            });
            if let Some(segment) = segment {
                doc.lines_mut(node).push(segment);
            }
            return State::NoChildren;
        }
        match strip_indent(reader) {
            Some(segment) => {
                doc.lines_mut(node).push(segment);
                State::NoChildren
            }
            None => State::Close,
        }
    }

    /// Drops trailing blank lines.
    fn close(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) {
        let source = reader.source();
        let lines = doc.lines(node);
        let mut keep = lines.len();
        while keep > 0 && lines.at(keep - 1).is_blank(source) {
            keep -= 1;
        }
        doc.lines_mut(node).set_sliced(0, keep);
    }

    fn can_interrupt_paragraph(&self) -> bool {
        false
    }

    fn can_accept_indented_line(&self) -> bool {
        true
    }
}
