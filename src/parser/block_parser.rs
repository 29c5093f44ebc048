//! Block structure pass.
//!
//! Lines are consumed one at a time. For each line the driver asks every
//! open block, outermost first, whether the line continues it. The first
//! block that does not continue (or the innermost container that does) is
//! where new blocks may open; blocks left behind are closed. A paragraph
//! that no block parser interrupts takes the line as a lazy continuation.

pub mod blockquotes;
pub mod code_blocks;
pub mod headings;
pub mod horizontal_rules;
pub mod html_blocks;
pub mod indented_code;
pub mod lists;
pub mod paragraphs;

use crate::ast::{Document, Kind, NodeId};
use crate::config::ParserConfig;
use crate::text::Reader;
use crate::utils::{indent_position, indent_width, is_blank};

use super::{Context, Parser, ParserBuilder};

pub use blockquotes::BlockquoteParser;
pub use code_blocks::FencedCodeParser;
pub use headings::{AtxHeadingParser, SetextHeadingParser};
pub use horizontal_rules::ThematicBreakParser;
pub use html_blocks::HtmlBlockParser;
pub use indented_code::IndentedCodeParser;
pub use lists::{ListItemParser, ListParser};
pub use paragraphs::ParagraphParser;

/// Outcome of opening or continuing a block on the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The block ends before the rest of this line.
    Close,
    /// The block continues and child blocks may open in the rest of the line.
    HasChildren,
    /// The block continues as a leaf.
    NoChildren,
    /// A leaf that replaces the paragraph just before it, such as a setext
    /// underline. The paragraph is closed, and if paragraph transformers
    /// consume it entirely the line is parsed again from scratch.
    RequireParagraph,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenBlock {
    pub(crate) node: NodeId,
    /// Index of the owning parser in the frozen parser list.
    pub(crate) parser: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenResult {
    NoBlocksOpened,
    NewBlocksOpened,
    ParagraphContinuation,
}

pub(crate) fn register_defaults(builder: &mut ParserBuilder, config: &ParserConfig) {
    builder
        .add_block_parser(SetextHeadingParser::new(config.attribute), 100)
        .add_block_parser(ThematicBreakParser, 200)
        .add_block_parser(ListParser, 300)
        .add_block_parser(ListItemParser, 400)
        .add_block_parser(IndentedCodeParser, 500)
        .add_block_parser(AtxHeadingParser::new(config.attribute), 600)
        .add_block_parser(FencedCodeParser, 700)
        .add_block_parser(BlockquoteParser, 800)
        .add_block_parser(HtmlBlockParser, 900)
        .add_block_parser(ParagraphParser, 1000);
}

/// Byte position of the first non-space character of `line` when the line is
/// indented by at most three columns and not blank.
pub(crate) fn block_offset(line: &str, column: usize) -> Option<usize> {
    let (width, pos) = indent_width(line, column);
    if width > 3 || pos >= line.len() || is_blank(&line[pos..]) {
        return None;
    }
    Some(pos)
}

/// [`indent_position`] for a reader that already has `padding` virtual
/// spaces pending.
pub(crate) fn indent_position_padded(
    line: &str,
    column: usize,
    padding: usize,
    width: usize,
) -> Option<(usize, usize)> {
    if padding >= width {
        return Some((0, padding - width));
    }
    indent_position(line, column + padding, width - padding)
}

fn remainder_is_blank(reader: &Reader<'_>) -> bool {
    reader.peek_line().is_none_or(is_blank)
}

impl Parser {
    pub(crate) fn parse_blocks(&self, doc: &mut Document, source: &str, pc: &mut Context) {
        let mut reader = Reader::from_source(source);
        let root = doc.root();
        let mut previous_blank = false;
        let mut line = 0;
        while !reader.is_eof() {
            previous_blank = self.parse_line(doc, root, &mut reader, pc, previous_blank);
            line += 1;
            reader.seek_line(line);
        }
        if let Some(last) = pc.opened.len().checked_sub(1) {
            self.close_blocks(doc, last, 0, &mut reader, pc);
        }
        log::debug!("Parsed {} lines of block structure", line);
    }

    /// Processes one line. Returns whether what remained of it, once the
    /// open containers took their prefixes, was blank.
    fn parse_line(
        &self,
        doc: &mut Document,
        root: NodeId,
        reader: &mut Reader<'_>,
        pc: &mut Context,
        previous_blank: bool,
    ) -> bool {
        let count = pc.opened.len();
        if count == 0 {
            let blank = remainder_is_blank(reader);
            if !blank {
                self.open_blocks(doc, root, previous_blank, reader, pc);
            }
            return blank;
        }

        let last_index = count - 1;
        let mut blank = false;
        for i in 0..count {
            let block = pc.opened[i];
            blank = remainder_is_blank(reader);
            if doc.kind(block.node) != Kind::PARAGRAPH {
                let state = self.block_parsers[block.parser].continue_block(doc, block.node, reader, pc);
                match state {
                    State::Close => {}
                    State::HasChildren if i == last_index => {
                        let blank = remainder_is_blank(reader);
                        if !blank {
                            self.open_blocks(doc, block.node, previous_blank, reader, pc);
                        }
                        return blank;
                    }
                    _ => continue,
                }
            }

            // `block` ends here unless the line is a lazy paragraph
            // continuation.
            let parent = match i {
                0 => root,
                _ => pc.opened[i - 1].node,
            };
            let last_node = pc.opened[last_index].node;
            let result = self.open_blocks(doc, parent, previous_blank, reader, pc);
            if result != OpenResult::ParagraphContinuation {
                // A setext heading takes the slot of the paragraph it absorbed.
                let last = if pc.opened.get(last_index).map(|b| b.node) == Some(last_node) {
                    Some(last_index)
                } else {
                    last_index.checked_sub(1)
                };
                if let Some(last) = last.filter(|&last| last >= i) {
                    self.close_blocks(doc, last, i, reader, pc);
                }
            }
            return blank;
        }
        blank
    }

    fn open_blocks(
        &self,
        doc: &mut Document,
        mut parent: NodeId,
        blank_line: bool,
        reader: &mut Reader<'_>,
        pc: &mut Context,
    ) -> OpenResult {
        let mut result = OpenResult::NoBlocksOpened;
        let mut continuable = pc
            .opened
            .last()
            .is_some_and(|block| doc.kind(block.node) == Kind::PARAGRAPH);

        'retry: loop {
            let Some(line) = reader.peek_line() else {
                break;
            };
            let (width, pos) = indent_width(line, reader.line_offset());
            if pos >= line.len() || is_blank(&line[pos..]) {
                break;
            }
            let trigger = line.as_bytes()[pos];
            for &index in &self.block_dispatch[trigger as usize] {
                let parser = &self.block_parsers[index];
                if continuable && result == OpenResult::NoBlocksOpened && !parser.can_interrupt_paragraph() {
                    continue;
                }
                if width > 3 && !parser.can_accept_indented_line() {
                    continue;
                }
                let last = pc.opened.last().copied();
                let Some((node, state)) = parser.open(doc, parent, reader, pc) else {
                    continue;
                };
                log::trace!("Opened {} at line {}", doc.kind_name(node), reader.position().line + 1);

                if state == State::RequireParagraph
                    && let Some(last) = last
                    && doc.last_child(parent) == Some(last.node)
                {
                    pc.opened.pop();
                    let mut removed = self.transform_paragraph(doc, last.node, reader.source(), pc);
                    if !removed {
                        self.block_parsers[last.parser].close(doc, last.node, reader, pc);
                        removed = doc.parent(last.node).is_none();
                    }
                    if removed {
                        continuable = false;
                        continue 'retry;
                    }
                }

                doc.set_blank_previous_lines(node, blank_line);
                doc.append_child(parent, node);
                result = OpenResult::NewBlocksOpened;
                pc.opened.push(OpenBlock { node, parser: index });
                if state == State::HasChildren {
                    parent = node;
                    continue 'retry;
                }
                break 'retry;
            }
            break;
        }

        if result == OpenResult::NoBlocksOpened
            && continuable
            && let Some(last) = pc.opened.last().copied()
            && self.block_parsers[last.parser].continue_block(doc, last.node, reader, pc) != State::Close
        {
            result = OpenResult::ParagraphContinuation;
        }
        result
    }

    /// Closes the open blocks at indices `to..=from`, innermost first.
    fn close_blocks(&self, doc: &mut Document, from: usize, to: usize, reader: &mut Reader<'_>, pc: &mut Context) {
        if from < to || from >= pc.opened.len() {
            return;
        }
        for i in (to..=from).rev() {
            let block = pc.opened[i];
            if doc.kind(block.node) == Kind::PARAGRAPH && doc.parent(block.node).is_some() {
                self.transform_paragraph(doc, block.node, reader.source(), pc);
            }
            if doc.parent(block.node).is_some() {
                self.block_parsers[block.parser].close(doc, block.node, reader, pc);
            }
        }
        pc.opened.drain(to..=from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeData;

    fn parse(input: &str) -> (Document, String) {
        let parser = ParserBuilder::with_defaults(&ParserConfig::default()).build();
        (parser.parse(input), input.to_string())
    }

    fn kinds(doc: &Document, id: NodeId) -> Vec<&'static str> {
        doc.children(id).map(|c| doc.kind_name(c)).collect()
    }

    #[test]
    fn test_block_offset() {
        assert_eq!(block_offset("   # a", 0), Some(3));
        assert_eq!(block_offset("    # a", 0), None);
        assert_eq!(block_offset("   \n", 0), None);
    }

    #[test]
    fn test_paragraphs_split_by_blank_line() {
        let (doc, source) = parse("a\nb\n\nc\n");
        let root = doc.root();
        assert_eq!(kinds(&doc, root), vec!["Paragraph", "Paragraph"]);
        let first = doc.first_child(root).unwrap();
        assert_eq!(doc.lines(first).value(&source), "a\nb");
    }

    #[test]
    fn test_lazy_continuation_in_blockquote() {
        let (doc, source) = parse("> a\nb\n");
        let root = doc.root();
        assert_eq!(kinds(&doc, root), vec!["Blockquote"]);
        let quote = doc.first_child(root).unwrap();
        let para = doc.first_child(quote).unwrap();
        assert_eq!(doc.lines(para).value(&source), "a\nb");
    }

    #[test]
    fn test_thematic_break_interrupts_paragraph() {
        let (doc, _) = parse("a\n***\nb\n");
        assert_eq!(
            kinds(&doc, doc.root()),
            vec!["Paragraph", "ThematicBreak", "Paragraph"]
        );
    }

    #[test]
    fn test_setext_heading_absorbs_paragraph() {
        let (doc, source) = parse("Foo\nbar\n---\n");
        let root = doc.root();
        assert_eq!(kinds(&doc, root), vec!["Heading"]);
        let heading = doc.first_child(root).unwrap();
        assert_eq!(doc.data(heading), &NodeData::Heading { level: 2 });
        assert_eq!(doc.lines(heading).value(&source), "Foo\nbar");
    }

    #[test]
    fn test_setext_underline_after_definition_only_is_a_break() {
        let (doc, _) = parse("[a]: /u\n---\n");
        assert_eq!(
            kinds(&doc, doc.root()),
            vec!["LinkReferenceDefinition", "ThematicBreak"]
        );
    }

    #[test]
    fn test_tight_and_loose_lists() {
        let (doc, _) = parse("- a\n- b\n");
        let list = doc.first_child(doc.root()).unwrap();
        assert!(matches!(doc.data(list), NodeData::List { tight: true, .. }));
        let item = doc.first_child(list).unwrap();
        assert_eq!(kinds(&doc, item), vec!["TextBlock"]);

        let (doc, _) = parse("- a\n\n- b\n");
        let list = doc.first_child(doc.root()).unwrap();
        assert!(matches!(doc.data(list), NodeData::List { tight: false, .. }));
        let item = doc.first_child(list).unwrap();
        assert_eq!(kinds(&doc, item), vec!["Paragraph"]);
    }

    #[test]
    fn test_nested_containers() {
        let (doc, source) = parse("> - a\n>   b\n> - c\n");
        let quote = doc.first_child(doc.root()).unwrap();
        let list = doc.first_child(quote).unwrap();
        assert_eq!(doc.child_count(list), 2);
        let first = doc.first_child(list).unwrap();
        let block = doc.first_child(first).unwrap();
        assert_eq!(doc.lines(block).value(&source), "a\nb");
    }

    #[test]
    fn test_fenced_code_in_list_keeps_list_tight() {
        let (doc, _) = parse("- ```\n  x\n  ```\n- b\n");
        let list = doc.first_child(doc.root()).unwrap();
        assert!(matches!(doc.data(list), NodeData::List { tight: true, .. }));
    }
}
