//! Markdown output that re-parses to the same tree.
//!
//! Text is written as it appears in the source, so escapes and entity
//! references survive untouched. Block layout is normalized: ATX headings
//! unless the content spans lines, `***` breaks, `\` hard breaks and one
//! blank line between blocks outside tight lists.

use crate::ast::{Document, Kind, KindRegistry, LinkData, NodeData, NodeId, ReferenceType};
use crate::error::ConfigError;

use super::{NodeRenderer, RenderContext, RenderError, WalkStatus};

pub struct MarkdownRenderer;

/// Whether a blank line separates `node` from its previous sibling.
fn needs_blank_line(doc: &Document, node: NodeId) -> bool {
    let Some(parent) = doc.parent(node) else {
        return false;
    };
    let list = match doc.data(parent) {
        NodeData::List { .. } => Some(parent),
        NodeData::ListItem { .. } => doc.parent(parent),
        _ => None,
    };
    !list.is_some_and(|list| matches!(doc.data(list), NodeData::List { tight: true, .. }))
}

/// Whether `s` contains one of `chars` that is not backslash-escaped.
fn has_unescaped(s: &str, chars: &[u8]) -> bool {
    let mut escaped = false;
    for b in s.bytes() {
        if escaped {
            escaped = false;
        } else if b == b'\\' {
            escaped = true;
        } else if chars.contains(&b) {
            return true;
        }
    }
    false
}

fn has_balanced_parens(s: &str) -> bool {
    let mut depth: isize = 0;
    let mut escaped = false;
    for b in s.bytes() {
        match b {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

pub(crate) fn format_destination(destination: &str) -> String {
    let bare = !destination.is_empty()
        && !destination.starts_with('<')
        && !destination.bytes().any(|b| b == b' ' || b.is_ascii_control())
        && has_balanced_parens(destination);
    if bare {
        destination.to_string()
    } else {
        format!("<{}>", destination)
    }
}

pub(crate) fn format_title(title: &str) -> String {
    if !has_unescaped(title, b"\"") {
        format!("\"{}\"", title)
    } else if !has_unescaped(title, b"'") {
        format!("'{}'", title)
    } else {
        format!("({})", title)
    }
}

/// The shortest backtick fence that does not occur as a run in `code`.
fn code_span_fence(code: &str) -> String {
    let mut runs = Vec::new();
    let mut run = 0;
    for c in code.chars().chain(std::iter::once('\0')) {
        if c == '`' {
            run += 1;
        } else if run > 0 {
            runs.push(run);
            run = 0;
        }
    }
    let mut n = 1;
    while runs.contains(&n) {
        n += 1;
    }
    "`".repeat(n)
}

/// Whether the line after a break inside `node`'s block could open a new
/// block if written flush. Continuation lines starting with a letter never
/// can; anything else is indented, which a paragraph absorbs.
fn continuation_needs_indent(doc: &Document, node: NodeId, source: &str) -> bool {
    match doc.next_sibling(node).map(|next| doc.data(next)) {
        Some(NodeData::Text { segment, .. }) => !segment
            .value(source)
            .chars()
            .next()
            .is_some_and(char::is_alphabetic),
        _ => true,
    }
}

fn longest_run(lines: &str, c: u8) -> usize {
    let mut longest: usize = 0;
    let mut run = 0;
    for b in lines.bytes() {
        if b == c {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

impl MarkdownRenderer {
    fn start_block(&self, ctx: &mut RenderContext<'_>, node: NodeId) -> Result<(), RenderError> {
        if ctx.doc.prev_sibling(node).is_some() {
            ctx.writer.ensure_newline()?;
            if needs_blank_line(ctx.doc, node) {
                ctx.write("\n")?;
            }
        }
        Ok(())
    }

    fn write_lines(&self, ctx: &mut RenderContext<'_>, node: NodeId) -> Result<(), RenderError> {
        let (doc, source) = (ctx.doc, ctx.source);
        for line in doc.lines(node).iter() {
            ctx.write(&line.value(source))?;
        }
        ctx.writer.ensure_newline()?;
        Ok(())
    }

    fn write_link_end(&self, ctx: &mut RenderContext<'_>, node: NodeId, link: &LinkData) -> Result<(), RenderError> {
        match link.reference_type {
            ReferenceType::Inline => {
                ctx.write("](")?;
                ctx.write(&format_destination(&link.destination))?;
                if let Some(title) = &link.title {
                    ctx.write(" ")?;
                    ctx.write(&format_title(title))?;
                }
                ctx.write(")")?;
            }
            ReferenceType::Full => {
                let label = link.label.as_deref().unwrap_or_default();
                ctx.write(&format!("][{}]", label))?;
            }
            ReferenceType::Collapsed => ctx.write("][]")?,
            ReferenceType::Shortcut => ctx.write("]")?,
        }
        log::trace!("Wrote {:?} link end for node {:?}", link.reference_type, node);
        Ok(())
    }

    fn render_block(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) -> Result<WalkStatus, RenderError> {
        let doc = ctx.doc;
        let source = ctx.source;
        if entering && node != doc.root() {
            self.start_block(ctx, node)?;
        }
        match doc.data(node) {
            NodeData::Document => {
                if !entering {
                    ctx.writer.ensure_newline()?;
                }
            }
            NodeData::Paragraph | NodeData::TextBlock => {
                if !entering {
                    ctx.writer.ensure_newline()?;
                }
            }
            NodeData::Heading { level } => {
                let setext = *level <= 2
                    && doc.descendants(node).into_iter().any(|n| match doc.data(n) {
                        NodeData::Text {
                            soft_break,
                            hard_break,
                            ..
                        } => *soft_break || *hard_break,
                        _ => false,
                    });
                match (entering, setext) {
                    (true, true) => {}
                    (true, false) => {
                        ctx.write(&"#".repeat(*level as usize))?;
                        if doc.has_children(node) {
                            ctx.write(" ")?;
                        }
                    }
                    (false, true) => {
                        ctx.writer.ensure_newline()?;
                        ctx.write(if *level == 1 { "===\n" } else { "---\n" })?;
                    }
                    (false, false) => ctx.writer.ensure_newline()?,
                }
            }
            NodeData::ThematicBreak => {
                if entering {
                    ctx.write("***\n")?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::CodeBlock => {
                if entering {
                    ctx.writer.push_prefix("    ")?;
                    self.write_lines(ctx, node)?;
                    ctx.writer.pop_prefix();
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::FencedCodeBlock { fence, fence_len, info, .. } => {
                if entering {
                    let content = doc.lines(node).value(source);
                    let length = (*fence_len).max(3).max(longest_run(&content, *fence) + 1);
                    let fence = (*fence as char).to_string().repeat(length);
                    ctx.write(&fence)?;
                    if let Some(info) = info {
                        ctx.write(" ")?;
                        ctx.write(info.raw(source))?;
                    }
                    ctx.write("\n")?;
                    self.write_lines(ctx, node)?;
                    ctx.write(&fence)?;
                    ctx.write("\n")?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::Blockquote => {
                if entering {
                    ctx.writer.push_prefix("> ")?;
                } else {
                    if !doc.has_children(node) {
                        ctx.write("\n")?;
                    }
                    ctx.writer.pop_prefix();
                }
            }
            NodeData::List { .. } => {}
            NodeData::ListItem { .. } => {
                if entering {
                    let marker = self.list_marker(doc, node);
                    ctx.write(&marker)?;
                    ctx.writer.push_hanging_prefix(" ".repeat(marker.len()));
                } else {
                    ctx.writer.ensure_newline()?;
                    ctx.writer.pop_prefix();
                }
            }
            NodeData::HtmlBlock { .. } => {
                if entering {
                    self.write_lines(ctx, node)?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::LinkReferenceDefinition {
                label,
                destination,
                title,
            } => {
                if entering {
                    ctx.write(&format!("[{}]: {}", label, format_destination(destination)))?;
                    if let Some(title) = title {
                        ctx.write(" ")?;
                        ctx.write(&format_title(title))?;
                    }
                    ctx.write("\n")?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            _ => {}
        }
        Ok(WalkStatus::Continue)
    }

    fn list_marker(&self, doc: &Document, item: NodeId) -> String {
        let Some(list) = doc.parent(item) else {
            return "- ".to_string();
        };
        match doc.data(list) {
            NodeData::List {
                marker,
                start: Some(start),
                ..
            } => {
                let index = doc.children(list).position(|n| n == item).unwrap_or(0);
                format!("{}{} ", *start as usize + index, *marker as char)
            }
            NodeData::List { marker, .. } => format!("{} ", *marker as char),
            _ => "- ".to_string(),
        }
    }

    fn render_inline(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) -> Result<WalkStatus, RenderError> {
        let doc = ctx.doc;
        let source = ctx.source;
        match doc.data(node) {
            NodeData::Text {
                segment,
                soft_break,
                hard_break,
                ..
            } => {
                if entering {
                    let value = segment.value(source);
                    ctx.write(&value)?;
                    // An odd backslash run would escape the line ending.
                    let dangling = value.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1;
                    match (*hard_break, *soft_break) {
                        (true, _) if dangling => ctx.write("  \n")?,
                        (true, _) => ctx.write("\\\n")?,
                        (false, true) if dangling => ctx.write(" \n")?,
                        (false, true) => ctx.write("\n")?,
                        (false, false) => {}
                    }
                    if (*hard_break || *soft_break) && continuation_needs_indent(doc, node, source) {
                        ctx.write("    ")?;
                    }
                }
            }
            NodeData::String { value, .. } => {
                if entering {
                    ctx.write(value)?;
                }
            }
            NodeData::CodeSpan => {
                if entering {
                    let code = doc.text_content(node, source);
                    let fence = code_span_fence(&code);
                    let pad = code.starts_with('`')
                        || code.ends_with('`')
                        || (code.starts_with(' ') && code.ends_with(' ') && !code.bytes().all(|b| b == b' '));
                    let space = if pad { " " } else { "" };
                    ctx.write(&format!("{fence}{space}{code}{space}{fence}"))?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::Emphasis { level, marker } => {
                ctx.write(&(*marker as char).to_string().repeat(*level as usize))?;
            }
            NodeData::Link(link) | NodeData::Image(link) => {
                if entering {
                    ctx.write(if doc.kind(node) == Kind::IMAGE { "![" } else { "[" })?;
                } else {
                    self.write_link_end(ctx, node, link)?;
                }
            }
            NodeData::AutoLink { value, .. } => {
                if entering {
                    ctx.write(&format!("<{}>", value.raw(source)))?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::RawHtml { segments } => {
                if entering {
                    ctx.write(&segments.value(source))?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::Delimiter(delimiter) => {
                if entering {
                    ctx.write(delimiter.segment.raw(source))?;
                }
            }
            _ => {}
        }
        Ok(WalkStatus::Continue)
    }
}

impl NodeRenderer for MarkdownRenderer {
    fn kinds(&self, _registry: &KindRegistry) -> Result<Vec<Kind>, ConfigError> {
        Ok(vec![
            Kind::DOCUMENT,
            Kind::PARAGRAPH,
            Kind::TEXT_BLOCK,
            Kind::HEADING,
            Kind::THEMATIC_BREAK,
            Kind::CODE_BLOCK,
            Kind::FENCED_CODE_BLOCK,
            Kind::BLOCKQUOTE,
            Kind::LIST,
            Kind::LIST_ITEM,
            Kind::HTML_BLOCK,
            Kind::LINK_REFERENCE_DEFINITION,
            Kind::TEXT,
            Kind::STRING,
            Kind::CODE_SPAN,
            Kind::EMPHASIS,
            Kind::LINK,
            Kind::IMAGE,
            Kind::AUTO_LINK,
            Kind::RAW_HTML,
            Kind::DELIMITER,
        ])
    }

    fn render(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) -> Result<WalkStatus, RenderError> {
        if ctx.doc.is_block(node) || node == ctx.doc.root() {
            self.render_block(ctx, node, entering)
        } else {
            self.render_inline(ctx, node, entering)
        }
    }
}
