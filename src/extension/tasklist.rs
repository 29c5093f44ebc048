//! `- [x] done` checkboxes at the start of list items.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Document, Kind, KindRegistry, NodeData, NodeId, NodeType};
use crate::config::OutputFormat;
use crate::error::ConfigError;
use crate::parser::{Context, InlineParser, ParserBuilder};
use crate::renderer::{HtmlOptions, NodeRenderer, RenderContext, RenderError, RendererBuilder, WalkStatus};
use crate::text::Reader;

use super::Extension;

pub const KIND_NAME: &str = "TaskCheckBox";

static TASK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([ \txX])\][ \t]*").unwrap());

pub struct TaskCheckBoxParser {
    kind: Kind,
}

impl InlineParser for TaskCheckBoxParser {
    fn trigger(&self) -> &[u8] {
        b"["
    }

    fn parse(&self, doc: &mut Document, parent: NodeId, block: &mut Reader<'_>, _pc: &mut Context) -> Option<NodeId> {
        // Only the very start of a list item's first block qualifies.
        let item = doc.parent(parent)?;
        if !matches!(doc.data(item), NodeData::ListItem { .. })
            || doc.first_child(item) != Some(parent)
            || doc.has_children(parent)
        {
            return None;
        }
        let line = block.peek_line()?;
        let captures = TASK.captures(&line)?;
        let checked = matches!(captures.get(1).map(|m| m.as_str()), Some("x" | "X"));
        let length = captures.get(0)?.end();
        block.advance(length);

        let node = doc.new_node(self.kind, NodeData::Extension);
        doc.attributes_mut(node).set("checked", checked.to_string());
        Some(node)
    }
}

fn is_checked(doc: &Document, node: NodeId) -> bool {
    doc.attributes(node).get("checked") == Some("true")
}

struct TaskCheckBoxRenderer {
    format: OutputFormat,
    options: HtmlOptions,
}

impl NodeRenderer for TaskCheckBoxRenderer {
    fn kinds(&self, registry: &KindRegistry) -> Result<Vec<Kind>, ConfigError> {
        Ok(vec![registry.require(KIND_NAME)?])
    }

    fn render(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) -> Result<WalkStatus, RenderError> {
        if !entering {
            return Ok(WalkStatus::Continue);
        }
        let checked = is_checked(ctx.doc, node);
        match self.format {
            OutputFormat::Html => {
                ctx.write("<input ")?;
                if checked {
                    ctx.write("checked=\"\" ")?;
                }
                ctx.write("disabled=\"\" type=\"checkbox\"")?;
                ctx.write(if self.options.xhtml { " /> " } else { "> " })?;
            }
            OutputFormat::Markdown => ctx.write(if checked { "[x] " } else { "[ ] " })?,
        }
        Ok(WalkStatus::Continue)
    }
}

pub struct TaskList;

impl Extension for TaskList {
    fn name(&self) -> &'static str {
        "TaskList"
    }

    fn extend_parser(&self, builder: &mut ParserBuilder) -> Result<(), ConfigError> {
        let kind = builder.register_kind(KIND_NAME, NodeType::Inline)?;
        builder.add_inline_parser(TaskCheckBoxParser { kind }, 0);
        Ok(())
    }

    fn extend_renderer(&self, builder: &mut RendererBuilder) -> Result<(), ConfigError> {
        let renderer = TaskCheckBoxRenderer {
            format: builder.format(),
            options: builder.html_options(),
        };
        builder.add_node_renderer(renderer, 500);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ParserConfig;

    fn render(source: &str, mut renderer: RendererBuilder) -> String {
        let mut parser = ParserBuilder::with_defaults(&ParserConfig::default());
        TaskList.extend_parser(&mut parser).unwrap();
        TaskList.extend_renderer(&mut renderer).unwrap();
        let parser = parser.build();
        let doc = parser.parse(source);
        let renderer = renderer.build(Arc::clone(parser.kinds())).unwrap();
        let mut out = Vec::new();
        renderer.render(&mut out, source, &doc).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_html_checkboxes() {
        assert_eq!(
            render("- [ ] a\n- [x] b\n", RendererBuilder::html(HtmlOptions::default())),
            "<ul>\n<li><input disabled=\"\" type=\"checkbox\"> a</li>\n\
             <li><input checked=\"\" disabled=\"\" type=\"checkbox\"> b</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_xhtml_checkbox() {
        let options = HtmlOptions {
            xhtml: true,
            ..Default::default()
        };
        assert_eq!(
            render("- [X] a\n", RendererBuilder::html(options)),
            "<ul>\n<li><input checked=\"\" disabled=\"\" type=\"checkbox\" /> a</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_only_at_item_start() {
        let html = render("[x] a\n\n- b [x]\n", RendererBuilder::html(HtmlOptions::default()));
        assert!(!html.contains("checkbox"));
    }

    #[test]
    fn test_markdown_output() {
        assert_eq!(render("* [X] a\n* [ ] b\n", RendererBuilder::markdown()), "* [x] a\n* [ ] b\n");
    }
}
