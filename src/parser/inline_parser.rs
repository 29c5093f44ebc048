//! Inline pass over the text of leaf blocks.
//!
//! Each paragraph, text block and heading is scanned left to right. At every
//! unescaped punctuation byte (and at whitespace and line starts) the inline
//! parsers registered for that byte are tried in priority order; bytes no
//! parser claims accumulate into [`Kind::TEXT`] nodes. Line endings become
//! soft or hard break flags on the text that precedes them.
//!
//! Emphasis-like runs are pushed as [`Kind::DELIMITER`] nodes and resolved by
//! [`process_delimiters`] when an enclosing link closes or the block ends.
//! Link openers (`[` and `![`) are tracked separately in [`LinkOpener`]s.

pub mod autolinks;
pub mod code_spans;
pub mod emphasis;
pub mod links;
pub mod raw_html;

use std::sync::Arc;

use crate::ast::{Delimiter, Document, Kind, NodeData, NodeId};
use crate::text::{Position, Reader, Segment};
use crate::utils::{is_punct, is_space};

use super::{Context, Parser, ParserBuilder};

pub use autolinks::AutoLinkParser;
pub use code_spans::CodeSpanParser;
pub use emphasis::{EmphasisDelimiterProcessor, EmphasisParser, scan_delimiter};
pub use links::LinkParser;
pub use raw_html::RawHtmlParser;

/// Decides how delimiter runs of one family pair up and what they become.
pub trait DelimiterProcessor: Send + Sync {
    fn is_delimiter(&self, b: u8) -> bool;

    fn can_open_closer(&self, opener: &Delimiter, closer: &Delimiter) -> bool;

    /// Creates the node wrapping the content between a matched pair, which
    /// consumed `consumes` characters from each side.
    fn on_match(&self, doc: &mut Document, consumes: usize, marker: u8) -> NodeId;
}

/// A delimiter node awaiting resolution, with the processor that scanned it.
pub(crate) struct DelimiterEntry {
    pub(crate) node: NodeId,
    pub(crate) processor: Arc<dyn DelimiterProcessor>,
}

/// An unmatched `[` or `![`.
#[derive(Debug, Clone, Copy)]
pub struct LinkOpener {
    pub node: NodeId,
    pub image: bool,
    /// Number of pending delimiters when the opener was seen; only those
    /// above it are resolved inside the link text.
    pub delimiter_bottom: usize,
    /// Cleared once a link forms around a later opener, since links do not
    /// nest.
    pub active: bool,
    /// Reader position just past the `[`.
    pub position: Position,
}

pub(crate) fn register_defaults(builder: &mut ParserBuilder) {
    builder
        .add_inline_parser(CodeSpanParser, 100)
        .add_inline_parser(LinkParser, 200)
        .add_inline_parser(AutoLinkParser, 300)
        .add_inline_parser(RawHtmlParser, 400)
        .add_inline_parser(EmphasisParser::new(), 500);
}

pub(crate) fn text_node(doc: &mut Document, segment: Segment) -> NodeId {
    doc.new_node(
        Kind::TEXT,
        NodeData::Text {
            segment,
            soft_break: false,
            hard_break: false,
            raw: false,
        },
    )
}

/// Appends `segment` as text, extending the last child instead when it is
/// plain text ending exactly where `segment` starts.
pub(crate) fn merge_or_append_text(doc: &mut Document, parent: NodeId, segment: Segment) {
    if segment.is_empty() {
        return;
    }
    if let Some(last) = doc.last_child(parent)
        && segment.padding == 0
        && let NodeData::Text {
            segment: previous,
            soft_break: false,
            hard_break: false,
            raw: false,
        } = doc.data_mut(last)
        && previous.end == segment.start
    {
        previous.end = segment.end;
        return;
    }
    let text = text_node(doc, segment);
    doc.append_child(parent, text);
}

/// Replaces `node` with text covering `segment`, merged into a preceding
/// adjacent text node when possible.
pub(crate) fn merge_or_replace_text(doc: &mut Document, node: NodeId, segment: Segment) {
    let Some(parent) = doc.parent(node) else {
        return;
    };
    if let Some(previous) = doc.prev_sibling(node)
        && let NodeData::Text {
            segment: previous_segment,
            soft_break: false,
            hard_break: false,
            raw: false,
        } = doc.data_mut(previous)
        && previous_segment.end == segment.start
    {
        previous_segment.end = segment.end;
        doc.remove_child(parent, node);
        return;
    }
    let text = text_node(doc, segment);
    doc.replace_child(parent, node, text);
}

fn delimiter_of(doc: &Document, node: NodeId) -> Option<Delimiter> {
    match doc.data(node) {
        NodeData::Delimiter(delimiter) => Some(*delimiter),
        _ => None,
    }
}

/// Characters an opener and closer give up to a match. Zero means the pair
/// may not match (the rule of three).
fn consumption(opener: &Delimiter, closer: &Delimiter) -> usize {
    if (opener.can_close || closer.can_open)
        && (opener.original_length + closer.original_length) % 3 == 0
        && closer.original_length % 3 != 0
    {
        return 0;
    }
    if opener.length() >= 2 && closer.length() >= 2 { 2 } else { 1 }
}

fn consume_characters(doc: &mut Document, node: NodeId, count: usize) -> usize {
    if let NodeData::Delimiter(delimiter) = doc.data_mut(node) {
        let length = delimiter.length().saturating_sub(count);
        delimiter.segment = delimiter.segment.with_end(delimiter.segment.start + length);
        return length;
    }
    0
}

/// Drops the pending delimiter at `index`. What is left of its run becomes
/// text; a fully consumed run disappears.
fn remove_delimiter(doc: &mut Document, pc: &mut Context, index: usize) {
    let entry = pc.delimiters.remove(index);
    let Some(delimiter) = delimiter_of(doc, entry.node) else {
        return;
    };
    if delimiter.length() == 0 {
        if let Some(parent) = doc.parent(entry.node) {
            doc.remove_child(parent, entry.node);
        }
    } else {
        merge_or_replace_text(doc, entry.node, delimiter.segment);
    }
}

/// Resolves the pending delimiters from index `bottom` upwards, wrapping
/// matched content in the nodes their processors create. Every delimiter
/// from `bottom` up is gone afterwards.
pub fn process_delimiters(doc: &mut Document, pc: &mut Context, bottom: usize) {
    let mut closer_index = bottom;
    while closer_index < pc.delimiters.len() {
        let closer = pc.delimiters[closer_index].node;
        let Some(closer_delimiter) = delimiter_of(doc, closer) else {
            closer_index += 1;
            continue;
        };
        if !closer_delimiter.can_close {
            closer_index += 1;
            continue;
        }

        let mut found = None;
        let mut maybe_opener = false;
        for opener_index in (bottom..closer_index).rev() {
            let entry = &pc.delimiters[opener_index];
            let Some(opener_delimiter) = delimiter_of(doc, entry.node) else {
                continue;
            };
            if opener_delimiter.can_open && entry.processor.can_open_closer(&opener_delimiter, &closer_delimiter) {
                maybe_opener = true;
                let consume = consumption(&opener_delimiter, &closer_delimiter);
                if consume > 0 {
                    found = Some((opener_index, opener_delimiter.char, consume));
                    break;
                }
            }
        }
        let Some((opener_index, marker, consume)) = found else {
            if !maybe_opener && !closer_delimiter.can_open {
                remove_delimiter(doc, pc, closer_index);
            } else {
                closer_index += 1;
            }
            continue;
        };

        let opener = pc.delimiters[opener_index].node;
        let opener_left = consume_characters(doc, opener, consume);
        let closer_left = consume_characters(doc, closer, consume);
        let processor = Arc::clone(&pc.delimiters[opener_index].processor);
        let node = processor.on_match(doc, consume, marker);
        log::trace!("Matched {} delimiters {:?} as {}", consume, marker as char, doc.kind_name(node));

        let Some(parent) = doc.parent(opener) else {
            closer_index += 1;
            continue;
        };
        let mut child = doc.next_sibling(opener);
        while let Some(current) = child
            && current != closer
        {
            child = doc.next_sibling(current);
            doc.append_child(node, current);
        }
        doc.insert_after(parent, opener, node);

        for index in (opener_index + 1..closer_index).rev() {
            remove_delimiter(doc, pc, index);
        }
        closer_index = opener_index + 1;
        if opener_left == 0 {
            remove_delimiter(doc, pc, opener_index);
            closer_index -= 1;
        }
        if closer_left == 0 {
            remove_delimiter(doc, pc, closer_index);
        }
    }
    while pc.delimiters.len() > bottom {
        remove_delimiter(doc, pc, pc.delimiters.len() - 1);
    }
}

/// How a line ends: the length of its content and the break it carries.
struct LineEnd {
    length: usize,
    soft: bool,
    hard: bool,
    /// A backslash break, whose content keeps trailing spaces.
    backslash: bool,
}

fn line_end(line: &[u8]) -> LineEnd {
    let len = line.len();
    let has_newline = line.last() == Some(&b'\n');
    let mut end = LineEnd {
        length: len,
        soft: false,
        hard: false,
        backslash: false,
    };
    if !has_newline {
        return end;
    }
    let cr = usize::from(len >= 2 && line[len - 2] == b'\r');
    let body = len - 1 - cr;
    let backslashes = line[..body].iter().rev().take_while(|&&b| b == b'\\').count();
    if backslashes % 2 == 1 {
        end.length = body - 1;
        end.hard = true;
        end.backslash = true;
    } else if body >= 2 && line[body - 1] == b' ' && line[body - 2] == b' ' {
        end.length = body - 2;
        end.hard = true;
    } else {
        end.length = body;
        end.soft = true;
    }
    end
}

impl Parser {
    pub(crate) fn parse_inline_blocks(&self, doc: &mut Document, source: &str, pc: &mut Context) {
        let blocks: Vec<NodeId> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|&id| doc.is_block(id) && !doc.data(id).is_raw() && !doc.lines(id).is_empty())
            .collect();
        for &block in &blocks {
            self.parse_inline_block(doc, block, source, pc);
        }
        log::debug!("Inline pass done over {} blocks", blocks.len());
    }

    fn parse_inline_block(&self, doc: &mut Document, block: NodeId, source: &str, pc: &mut Context) {
        let mut reader = Reader::new(source, doc.lines(block).clone());
        let mut escaped = false;

        'lines: while let Some(line) = reader.peek_line() {
            let bytes = line.as_bytes();
            let end = line_end(bytes);
            let line_base = reader.offset();
            let mut start = line_base;
            let mut padding = reader.padding();
            let mut n = 0;

            for (i, &c) in bytes[..end.length].iter().enumerate() {
                if c == b'\n' {
                    break;
                }
                let space = is_space(c) && c != b'\r';
                let punct = is_punct(c);
                if (punct && !escaped) || space || i == 0 {
                    let trigger = if space || (i == 0 && !punct) { b' ' } else { c };
                    let parsers = &self.inline_dispatch[trigger as usize];
                    if !parsers.is_empty() {
                        reader.advance(n);
                        n = 0;
                        let saved = reader.position();
                        if i != 0 {
                            merge_or_append_text(doc, block, Segment::with_padding(start, reader.offset(), padding));
                            start = reader.offset();
                            padding = 0;
                        }
                        for &index in parsers {
                            if let Some(node) = self.inline_parsers[index].parse(doc, block, &mut reader, pc) {
                                doc.append_child(block, node);
                                continue 'lines;
                            }
                            reader.set_position(saved);
                        }
                    }
                }
                escaped = !escaped && c == b'\\';
                n += 1;
            }

            let mut segment = Segment::with_padding(start, line_base + end.length, padding);
            if !end.backslash {
                segment = segment.trim_right_space(source);
            }
            append_line_text(doc, block, segment, end.soft, end.hard);
            reader.advance_line();
        }

        log::trace!(
            "Resolving {} delimiters in {}",
            pc.delimiters.len(),
            doc.kind_name(block)
        );
        process_delimiters(doc, pc, 0);
        for parser in &self.inline_parsers {
            parser.close_block(doc, block, pc);
        }
    }
}

/// Appends the last text of a line with its break flags, folding it into an
/// adjacent plain text node so each line break ends exactly one text node.
fn append_line_text(doc: &mut Document, block: NodeId, segment: Segment, soft: bool, hard: bool) {
    if let Some(last) = doc.last_child(block)
        && segment.padding == 0
        && let NodeData::Text {
            segment: previous,
            soft_break,
            hard_break,
            raw: false,
        } = doc.data_mut(last)
        && !*soft_break
        && !*hard_break
        && previous.end == segment.start
    {
        previous.end = segment.end;
        *soft_break = soft;
        *hard_break = hard;
        return;
    }
    if segment.is_empty() && !soft && !hard {
        return;
    }
    let text = doc.new_node(
        Kind::TEXT,
        NodeData::Text {
            segment,
            soft_break: soft,
            hard_break: hard,
            raw: false,
        },
    );
    doc.append_child(block, text);
}
