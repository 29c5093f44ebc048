//! Parsing for inline code spans (`code`).

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::{Context, InlineParser};
use crate::text::{Reader, Segment};

use super::text_node;

/// Normalizes code span content: line endings become spaces, and one space
/// is stripped from each end when both ends have one and the content is not
/// all spaces.
fn normalize_content(raw: &str) -> String {
    let content = raw.replace("\r\n", " ").replace('\n', " ");
    let bytes = content.as_bytes();
    if bytes.len() >= 2
        && bytes[0] == b' '
        && bytes[bytes.len() - 1] == b' '
        && !bytes.iter().all(|&b| b == b' ')
    {
        return content[1..content.len() - 1].to_string();
    }
    content
}

pub struct CodeSpanParser;

impl InlineParser for CodeSpanParser {
    fn trigger(&self) -> &[u8] {
        b"`"
    }

    fn parse(&self, doc: &mut Document, _parent: NodeId, block: &mut Reader<'_>, _pc: &mut Context) -> Option<NodeId> {
        let line = block.peek_line()?;
        let opening = line.bytes().take_while(|&b| b == b'`').count();
        if opening == 0 {
            return None;
        }
        let start = block.offset();
        block.advance(opening);
        let content_start = block.position();

        while let Some(line) = block.peek_line() {
            let bytes = line.as_bytes();
            let mut i = 0;
            while i < bytes.len() {
                if bytes[i] != b'`' {
                    i += 1;
                    continue;
                }
                let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                if run == opening {
                    block.advance(i);
                    let content = block.between(content_start, block.position()).value(block.source());
                    block.advance(run);
                    let value = normalize_content(&content);
                    log::trace!("Code span {:?}", value);
                    let node = doc.new_node(Kind::CODE_SPAN, NodeData::CodeSpan);
                    let string = doc.new_node(Kind::STRING, NodeData::String { value, raw: true });
                    doc.append_child(node, string);
                    return Some(node);
                }
                i += run;
            }
            block.advance_line();
        }

        // No closer of the same length: the whole run is literal.
        block.set_position(content_start);
        Some(text_node(doc, Segment::new(start, start + opening)))
    }
}
