//! Fenced code blocks delimited by runs of backticks or tildes.

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::{BlockParser, Context, State};
use crate::text::{Reader, Segment};
use crate::utils::{indent_width, is_blank, is_space};

use super::{block_offset, indent_position_padded};

pub struct FencedCodeParser;

impl BlockParser for FencedCodeParser {
    fn trigger(&self) -> &[u8] {
        b"`~"
    }

    fn open(
        &self,
        doc: &mut Document,
        _parent: NodeId,
        reader: &mut Reader<'_>,
        _pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        let line = reader.peek_line()?;
        let start = reader.offset();
        let column = reader.line_offset();
        let pos = block_offset(line, column)?;
        let bytes = line.as_bytes();
        let fence = bytes[pos];
        if fence != b'`' && fence != b'~' {
            return None;
        }
        let fence_len = bytes[pos..].iter().take_while(|&&b| b == fence).count();
        if fence_len < 3 {
            return None;
        }

        let rest = &line[pos + fence_len..];
        if fence == b'`' && rest.contains('`') {
            return None;
        }
        let leading = rest.bytes().take_while(|&b| is_space(b)).count();
        let trailing = rest[leading..].bytes().rev().take_while(|&b| is_space(b)).count();
        let info_len = rest.len() - leading - trailing;
        let info = (info_len > 0).then(|| {
            let info_start = start + pos + fence_len + leading;
            Segment::new(info_start, info_start + info_len)
        });

        let (indent, _) = indent_width(line, column);
        log::trace!("Fenced code open: fence={:?} len={}", fence as char, fence_len);
        let node = doc.new_node(
            Kind::FENCED_CODE_BLOCK,
            NodeData::FencedCodeBlock {
                fence,
                fence_len,
                indent,
                info,
            },
        );
        Some((node, State::NoChildren))
    }

    fn continue_block(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) -> State {
        let NodeData::FencedCodeBlock {
            fence,
            fence_len,
            indent,
            ..
        } = *doc.data(node)
        else {
            return State::Close;
        };
        let (Some(line), Some(segment)) = (reader.peek_line(), reader.peek_line_segment()) else {
            return State::Close;
        };
        let column = reader.line_offset();

        let (width, pos) = indent_width(line, column);
        if width < 4 {
            let run = line[pos..].bytes().take_while(|&b| b == fence).count();
            if run >= fence_len && is_blank(&line[pos + run..]) {
                let newline = usize::from(line.ends_with('\n'));
                reader.advance(line.len() - newline);
                return State::Close;
            }
        }

        let (pos, padding) = indent_position_padded(line, column, reader.padding(), indent)
            .unwrap_or_else(|| (indent_width(line, column).1, 0));
        doc.lines_mut(node)
            .push(Segment::with_padding(segment.start + pos, segment.end, padding));
        State::NoChildren
    }

    fn can_interrupt_paragraph(&self) -> bool {
        true
    }

    fn can_accept_indented_line(&self) -> bool {
        false
    }
}
