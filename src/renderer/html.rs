//! CommonMark HTML output.

use crate::ast::{AutoLinkType, Kind, KindRegistry, LinkData, NodeData, NodeId};
use crate::config::RendererConfig;
use crate::error::ConfigError;
use crate::utils::{escape_html, unescape, url_escape};

use super::{NodeRenderer, RenderContext, RenderError, WalkStatus};

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Write raw HTML and dangerous link destinations through. Otherwise
    /// raw HTML is replaced by a comment and such destinations are dropped.
    pub unsafe_html: bool,
    pub xhtml: bool,
    /// Render soft line breaks as `<br>`.
    pub hard_wraps: bool,
}

impl From<&RendererConfig> for HtmlOptions {
    fn from(config: &RendererConfig) -> Self {
        Self {
            unsafe_html: config.unsafe_html,
            xhtml: config.xhtml,
            hard_wraps: config.hard_wraps,
        }
    }
}

/// Whether following `url` could run script or load local content. Data
/// URLs are allowed for common image types only.
pub fn is_dangerous_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    if let Some(data) = lower.strip_prefix("data:") {
        return !["image/png", "image/gif", "image/jpeg", "image/webp"]
            .iter()
            .any(|t| data.starts_with(t));
    }
    ["javascript:", "vbscript:", "file:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

pub struct HtmlRenderer {
    options: HtmlOptions,
}

impl HtmlRenderer {
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }

    fn void_end(&self) -> &'static str {
        if self.options.xhtml { " />" } else { ">" }
    }

    fn line_break(&self) -> &'static str {
        if self.options.xhtml { "<br />\n" } else { "<br>\n" }
    }

    fn write_attributes(&self, ctx: &mut RenderContext<'_>, node: NodeId) -> Result<(), RenderError> {
        let doc = ctx.doc;
        for (name, value) in doc.attributes(node).iter() {
            ctx.write(&format!(" {}=\"{}\"", name, escape_html(value)))?;
        }
        Ok(())
    }

    fn destination(&self, raw: &str) -> String {
        let url = unescape(raw);
        if !self.options.unsafe_html && is_dangerous_url(&url) {
            return String::new();
        }
        escape_html(&url_escape(&url)).into_owned()
    }

    fn write_title(&self, ctx: &mut RenderContext<'_>, link: &LinkData) -> Result<(), RenderError> {
        if let Some(title) = &link.title {
            ctx.write(&format!(" title=\"{}\"", escape_html(&unescape(title))))?;
        }
        Ok(())
    }

    fn write_lines(&self, ctx: &mut RenderContext<'_>, node: NodeId, escape: bool) -> Result<(), RenderError> {
        let value = ctx.doc.lines(node).block_value(ctx.source);
        if escape {
            ctx.write(&escape_html(&value))?;
        } else {
            ctx.write(&value)?;
        }
        Ok(())
    }

    fn render_block(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) -> Result<WalkStatus, RenderError> {
        let doc = ctx.doc;
        match doc.data(node) {
            NodeData::Document => {}
            NodeData::Paragraph => ctx.write(if entering { "<p>" } else { "</p>\n" })?,
            NodeData::TextBlock => {
                if !entering && doc.next_sibling(node).is_some() && doc.has_children(node) {
                    ctx.write("\n")?;
                }
            }
            NodeData::Heading { level } => {
                if entering {
                    ctx.write(&format!("<h{}", level))?;
                    self.write_attributes(ctx, node)?;
                    ctx.write(">")?;
                } else {
                    ctx.write(&format!("</h{}>\n", level))?;
                }
            }
            NodeData::ThematicBreak => {
                if entering {
                    ctx.write("<hr")?;
                    self.write_attributes(ctx, node)?;
                    ctx.write(self.void_end())?;
                    ctx.write("\n")?;
                }
            }
            NodeData::CodeBlock => {
                if entering {
                    ctx.write("<pre><code>")?;
                    self.write_lines(ctx, node, true)?;
                    ctx.write("</code></pre>\n")?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::FencedCodeBlock { info, .. } => {
                if entering {
                    ctx.write("<pre><code")?;
                    let info = info.map(|s| s.value(ctx.source).into_owned()).unwrap_or_default();
                    if let Some(language) = info.split_whitespace().next() {
                        ctx.write(&format!(" class=\"language-{}\"", escape_html(&unescape(language))))?;
                    }
                    ctx.write(">")?;
                    self.write_lines(ctx, node, true)?;
                    ctx.write("</code></pre>\n")?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::Blockquote => ctx.write(if entering { "<blockquote>\n" } else { "</blockquote>\n" })?,
            NodeData::List { start, .. } => match (entering, start) {
                (true, Some(1)) => ctx.write("<ol>\n")?,
                (true, Some(n)) => ctx.write(&format!("<ol start=\"{}\">\n", n))?,
                (true, None) => ctx.write("<ul>\n")?,
                (false, Some(_)) => ctx.write("</ol>\n")?,
                (false, None) => ctx.write("</ul>\n")?,
            },
            NodeData::ListItem { .. } => {
                if entering {
                    ctx.write("<li>")?;
                    if let Some(first) = doc.first_child(node)
                        && doc.kind(first) != Kind::TEXT_BLOCK
                    {
                        ctx.write("\n")?;
                    }
                } else {
                    ctx.write("</li>\n")?;
                }
            }
            NodeData::HtmlBlock { .. } => {
                if entering {
                    if self.options.unsafe_html {
                        self.write_lines(ctx, node, false)?;
                        ctx.writer.ensure_newline()?;
                    } else {
                        ctx.write(RAW_HTML_OMITTED)?;
                        ctx.write("\n")?;
                    }
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::LinkReferenceDefinition { .. } => return Ok(WalkStatus::SkipChildren),
            _ => {}
        }
        Ok(WalkStatus::Continue)
    }

    fn render_inline(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) -> Result<WalkStatus, RenderError> {
        let doc = ctx.doc;
        let source = ctx.source;
        match doc.data(node) {
            NodeData::Text {
                segment,
                soft_break,
                hard_break,
                raw,
            } => {
                if !entering {
                    return Ok(WalkStatus::Continue);
                }
                let value = segment.value(source);
                if *raw {
                    ctx.write(&escape_html(&value))?;
                } else {
                    ctx.write(&escape_html(&unescape(&value)))?;
                }
                if *hard_break || (*soft_break && self.options.hard_wraps) {
                    ctx.write(self.line_break())?;
                } else if *soft_break {
                    ctx.write("\n")?;
                }
            }
            NodeData::String { value, raw } => {
                if entering {
                    if *raw {
                        ctx.write(&escape_html(value))?;
                    } else {
                        ctx.write(&escape_html(&unescape(value)))?;
                    }
                }
            }
            NodeData::CodeSpan => ctx.write(if entering { "<code>" } else { "</code>" })?,
            NodeData::Emphasis { level, .. } => {
                let tag = if *level == 2 { "strong" } else { "em" };
                if entering {
                    ctx.write(&format!("<{}>", tag))?;
                } else {
                    ctx.write(&format!("</{}>", tag))?;
                }
            }
            NodeData::Link(link) => {
                if entering {
                    ctx.write(&format!("<a href=\"{}\"", self.destination(&link.destination)))?;
                    self.write_title(ctx, link)?;
                    ctx.write(">")?;
                } else {
                    ctx.write("</a>")?;
                }
            }
            NodeData::Image(link) => {
                if entering {
                    ctx.write(&format!("<img src=\"{}\" alt=\"", self.destination(&link.destination)))?;
                    let alt = doc.text_content(node, source);
                    ctx.write(&escape_html(&alt))?;
                    ctx.write("\"")?;
                    self.write_title(ctx, link)?;
                    ctx.write(self.void_end())?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::AutoLink { link_type, value } => {
                if entering {
                    let label = value.raw(source);
                    let href = match link_type {
                        AutoLinkType::Email if !label.to_ascii_lowercase().starts_with("mailto:") => {
                            format!("mailto:{}", label)
                        }
                        _ => label.to_string(),
                    };
                    ctx.write(&format!(
                        "<a href=\"{}\">{}</a>",
                        escape_html(&url_escape(&href)),
                        escape_html(label)
                    ))?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::RawHtml { segments } => {
                if entering {
                    if self.options.unsafe_html {
                        ctx.write(&segments.value(source))?;
                    } else {
                        ctx.write(RAW_HTML_OMITTED)?;
                    }
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeData::Delimiter(delimiter) => {
                if entering {
                    ctx.write(&escape_html(delimiter.segment.raw(source)))?;
                }
            }
            _ => {}
        }
        Ok(WalkStatus::Continue)
    }
}

impl NodeRenderer for HtmlRenderer {
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ParserConfig;
    use crate::parser::ParserBuilder;
    use crate::renderer::RendererBuilder;

    fn html_with(source: &str, options: HtmlOptions) -> String {
        let parser = ParserBuilder::with_defaults(&ParserConfig::default()).build();
        let doc = parser.parse(source);
        let renderer = RendererBuilder::html(options)
            .build(Arc::clone(parser.kinds()))
            .unwrap();
        let mut out = Vec::new();
        renderer.render(&mut out, source, &doc).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn html(source: &str) -> String {
        html_with(source, HtmlOptions::default())
    }

    #[test]
    fn test_paragraph_and_emphasis() {
        assert_eq!(html("a *b* **c**\n"), "<p>a <em>b</em> <strong>c</strong></p>\n");
    }

    #[test]
    fn test_escapes_and_entities() {
        assert_eq!(html("\\*a\\* &amp; &copy; <\n"), "<p>*a* &amp; © &lt;</p>\n");
    }

    #[test]
    fn test_heading_and_break() {
        assert_eq!(html("# Title\n\n***\n"), "<h1>Title</h1>\n<hr>\n");
        let xhtml = HtmlOptions {
            xhtml: true,
            ..Default::default()
        };
        assert_eq!(html_with("a  \nb\n", xhtml), "<p>a<br />\nb</p>\n");
    }

    #[test]
    fn test_hard_wraps() {
        let options = HtmlOptions {
            hard_wraps: true,
            ..Default::default()
        };
        assert_eq!(html_with("a\nb\n", options), "<p>a<br>\nb</p>\n");
    }

    #[test]
    fn test_tight_and_loose_lists() {
        assert_eq!(html("- a\n- b\n"), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
        assert_eq!(
            html("3. a\n\n4. b\n"),
            "<ol start=\"3\">\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_code_blocks() {
        assert_eq!(html("    <a>\n"), "<pre><code>&lt;a&gt;\n</code></pre>\n");
        assert_eq!(
            html("```rust extra\nfn main() {}\n```\n"),
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n"
        );
        assert_eq!(html("`a<b`"), "<p><code>a&lt;b</code></p>\n");
    }

    #[test]
    fn test_blocks_ending_the_input_close_their_last_line() {
        assert_eq!(html("    a\n    c"), "<pre><code>a\nc\n</code></pre>\n");
        assert_eq!(html("```\ncode"), "<pre><code>code\n</code></pre>\n");
        let unsafe_html = HtmlOptions {
            unsafe_html: true,
            ..Default::default()
        };
        assert_eq!(html_with("<div>\nx\n</div>", unsafe_html), "<div>\nx\n</div>\n");
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            html("[a](/u?x=1&y \"t\") ![i *x*](/p.png)\n"),
            "<p><a href=\"/u?x=1&amp;y\" title=\"t\">a</a> <img src=\"/p.png\" alt=\"i x\"></p>\n"
        );
        assert_eq!(html("[a](<b c>)"), "<p><a href=\"b%20c\">a</a></p>\n");
        assert_eq!(
            html("<https://x.y> <a@b.c>"),
            "<p><a href=\"https://x.y\">https://x.y</a> <a href=\"mailto:a@b.c\">a@b.c</a></p>\n"
        );
    }

    #[test]
    fn test_dangerous_urls() {
        assert!(is_dangerous_url("javascript:alert(1)"));
        assert!(is_dangerous_url("JAVASCRIPT:x"));
        assert!(is_dangerous_url("data:text/html,x"));
        assert!(!is_dangerous_url("data:image/png;base64,x"));
        assert!(!is_dangerous_url("https://x"));
        assert_eq!(html("[a](javascript:x)"), "<p><a href=\"\">a</a></p>\n");
    }

    #[test]
    fn test_raw_html_omitted_unless_unsafe() {
        assert_eq!(html("<div>\nx\n</div>\n"), "<!-- raw HTML omitted -->\n");
        assert_eq!(html("a <b>c</b>"), "<p>a <!-- raw HTML omitted -->c<!-- raw HTML omitted --></p>\n");
        let options = HtmlOptions {
            unsafe_html: true,
            ..Default::default()
        };
        assert_eq!(html_with("<div>\nx\n</div>\n", options), "<div>\nx\n</div>\n");
        assert_eq!(html_with("a <b>c</b>", options), "<p>a <b>c</b></p>\n");
    }

    #[test]
    fn test_blockquote_and_reference_definition() {
        assert_eq!(
            html("[r]: /u\n\n> [x][r]\n"),
            "<blockquote>\n<p><a href=\"/u\">x</a></p>\n</blockquote>\n"
        );
    }
}
