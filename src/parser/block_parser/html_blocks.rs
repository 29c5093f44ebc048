//! HTML blocks, recognized by the seven CommonMark start conditions.
//!
//! Types 1 to 5 run until a line containing their end marker (that line is
//! part of the block). Types 6 and 7 run until a blank line. Type 7 cannot
//! interrupt a paragraph.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Document, HtmlBlockType, Kind, NodeData, NodeId};
use crate::parser::{BlockParser, Context, State};
use crate::text::Reader;
use crate::utils::is_blank;

/// HTML block-level tags as defined by CommonMark.
/// These tags start a type 6 block when found at the start of a line.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "base",
    "basefont",
    "blockquote",
    "body",
    "caption",
    "center",
    "col",
    "colgroup",
    "dd",
    "details",
    "dialog",
    "dir",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "frame",
    "frameset",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "head",
    "header",
    "hr",
    "html",
    "iframe",
    "legend",
    "li",
    "link",
    "main",
    "menu",
    "menuitem",
    "nav",
    "noframes",
    "ol",
    "optgroup",
    "option",
    "p",
    "param",
    "search",
    "section",
    "summary",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "title",
    "tr",
    "track",
    "ul",
];

/// Tags whose content is verbatim (type 1).
const VERBATIM_TAGS: &[&str] = &["script", "style", "pre", "textarea"];

static TYPE1_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ {0,3}<(?:script|pre|style|textarea)(?:\s|>|$)").unwrap());
static TYPE1_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(?:script|pre|style|textarea)>").unwrap());
static TYPE2_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}<!--").unwrap());
static TYPE3_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}<\?").unwrap());
static TYPE4_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}<![A-Za-z]").unwrap());
static TYPE5_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}<!\[CDATA\[").unwrap());
static TYPE6_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}</?([A-Za-z][A-Za-z0-9-]*)(?:\s|/?>|$)").unwrap());
static TYPE7_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    let attribute = r#"(?:\s+[A-Za-z_:][A-Za-z0-9_.:-]*(?:\s*=\s*(?:[^\s"'=<>`]+|'[^']*'|"[^"]*"))?)"#;
    Regex::new(&format!(
        r"^ {{0,3}}(?:<([A-Za-z][A-Za-z0-9-]*){attribute}*\s*/?>|</([A-Za-z][A-Za-z0-9-]*)\s*>)\s*$"
    ))
    .unwrap()
});

/// Which start condition, if any, `line` meets.
fn start_condition(line: &str, interrupts_paragraph: bool) -> Option<HtmlBlockType> {
    if TYPE1_OPEN.is_match(line) {
        return Some(HtmlBlockType::Raw);
    }
    if TYPE2_OPEN.is_match(line) {
        return Some(HtmlBlockType::Comment);
    }
    if TYPE3_OPEN.is_match(line) {
        return Some(HtmlBlockType::ProcessingInstruction);
    }
    if TYPE4_OPEN.is_match(line) {
        return Some(HtmlBlockType::Declaration);
    }
    if TYPE5_OPEN.is_match(line) {
        return Some(HtmlBlockType::Cdata);
    }
    if let Some(captures) = TYPE6_OPEN.captures(line) {
        let tag = captures[1].to_ascii_lowercase();
        if BLOCK_TAGS.contains(&tag.as_str()) {
            return Some(HtmlBlockType::Known);
        }
    }
    if !interrupts_paragraph && let Some(captures) = TYPE7_OPEN.captures(line) {
        let tag = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        if !VERBATIM_TAGS.contains(&tag.as_str()) {
            return Some(HtmlBlockType::Other);
        }
    }
    None
}

/// Whether `line` satisfies the end condition of a type 1 to 5 block.
fn ends_block(html_type: HtmlBlockType, line: &str) -> bool {
    match html_type {
        HtmlBlockType::Raw => TYPE1_CLOSE.is_match(line),
        HtmlBlockType::Comment => line.contains("-->"),
        HtmlBlockType::ProcessingInstruction => line.contains("?>"),
        HtmlBlockType::Declaration => line.contains('>'),
        HtmlBlockType::Cdata => line.contains("]]>"),
        HtmlBlockType::Known | HtmlBlockType::Other => false,
    }
}

pub struct HtmlBlockParser;

impl BlockParser for HtmlBlockParser {
    fn trigger(&self) -> &[u8] {
        b"<"
    }

    fn open(
        &self,
        doc: &mut Document,
        _parent: NodeId,
        reader: &mut Reader<'_>,
        pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        let line = reader.peek_line()?;
        let segment = reader.peek_line_segment()?;
        let after_paragraph = pc
            .last_opened_block()
            .is_some_and(|last| doc.kind(last) == Kind::PARAGRAPH);
        let html_type = start_condition(line, after_paragraph)?;
        log::trace!("HTML block of type {:?}", html_type);
        let node = doc.new_node(Kind::HTML_BLOCK, NodeData::HtmlBlock { html_type });
        doc.lines_mut(node).push(segment);
        Some((node, State::NoChildren))
    }

    fn continue_block(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) -> State {
        let NodeData::HtmlBlock { html_type } = *doc.data(node) else {
            return State::Close;
        };
        let (Some(line), Some(segment)) = (reader.peek_line(), reader.peek_line_segment()) else {
            return State::Close;
        };
        match html_type {
            HtmlBlockType::Known | HtmlBlockType::Other => {
                if is_blank(line) {
                    return State::Close;
                }
            }
            _ => {
                let source = reader.source();
                if doc.lines(node).last().is_some_and(|last| ends_block(html_type, last.raw(source))) {
                    return State::Close;
                }
            }
        }
        doc.lines_mut(node).push(segment);
        State::NoChildren
    }

    fn can_interrupt_paragraph(&self) -> bool {
        true
    }

    fn can_accept_indented_line(&self) -> bool {
        false
    }
}
