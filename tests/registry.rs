//! Kind registration, priority ordering and renderer dispatch.

use markweave::ast::{NodeData, NodeType};
use markweave::extension::{Strikethrough, TaskList};
use markweave::parser::{Context, InlineParser};
use markweave::renderer::{NodeRenderer, RenderContext, WalkStatus};
use markweave::text::Reader;
use markweave::{
    Config, ConfigBuilder, ConfigError, Document, Extension, Kind, KindRegistry, Markdown, NodeId, OutputFormat,
    ParserBuilder, RenderError, RendererBuilder,
};

const EVERYTHING: &str = "\
# ATX *em* **strong**

Setext
------

***

    indented

```rust
fenced
```

> quote with `code` and <span>html</span>

- [x] done ~~gone~~
- item

1. ordered

<div>
block
</div>

[ref]: /u \"t\"

[link](/x) [ref] ![img](/i.png) <https://a.b> hard
break
";

fn markdown(format: OutputFormat) -> Markdown {
    let config = ConfigBuilder::default()
        .format(format)
        .strikethrough(true)
        .task_list(true)
        .build();
    Markdown::new(&config).unwrap()
}

#[test]
fn test_every_parsed_kind_has_a_renderer() {
    for format in [OutputFormat::Html, OutputFormat::Markdown] {
        let markdown = markdown(format);
        let doc = markdown.parse(EVERYTHING);
        for node in doc.descendants(doc.root()) {
            assert!(
                markdown.renderer().has_renderer(doc.kind(node)),
                "{:?} renderer lacks {}",
                format,
                doc.kind_name(node)
            );
        }
        let mut out = Vec::new();
        markdown.render(&mut out, EVERYTHING, &doc).unwrap();
    }
}

#[test]
fn test_every_registered_kind_has_a_renderer() {
    for format in [OutputFormat::Html, OutputFormat::Markdown] {
        let markdown = markdown(format);
        for (kind, name) in markdown.parser().kinds().iter() {
            assert!(markdown.renderer().has_renderer(kind), "{:?} renderer lacks {}", format, name);
        }
    }
}

#[test]
fn test_corpus_reaches_the_interesting_kinds() {
    let markdown = markdown(OutputFormat::Html);
    let doc = markdown.parse(EVERYTHING);
    let mut seen: Vec<_> = doc.descendants(doc.root()).into_iter().map(|n| doc.kind_name(n)).collect();
    seen.sort_unstable();
    seen.dedup();
    for name in [
        "AutoLink",
        "Blockquote",
        "CodeBlock",
        "CodeSpan",
        "Emphasis",
        "FencedCodeBlock",
        "Heading",
        "HtmlBlock",
        "Image",
        "Link",
        "LinkReferenceDefinition",
        "List",
        "ListItem",
        "Paragraph",
        "RawHtml",
        "Strikethrough",
        "TaskCheckBox",
        "Text",
        "TextBlock",
        "ThematicBreak",
    ] {
        assert!(seen.contains(&name), "{} not produced", name);
    }
}

struct Italic;

impl NodeRenderer for Italic {
    fn kinds(&self, _registry: &KindRegistry) -> Result<Vec<Kind>, ConfigError> {
        Ok(vec![Kind::EMPHASIS])
    }

    fn render(&self, ctx: &mut RenderContext<'_>, _node: NodeId, entering: bool) -> Result<WalkStatus, RenderError> {
        ctx.write(if entering { "<i>" } else { "</i>" })?;
        Ok(WalkStatus::Continue)
    }
}

fn render_html(builder: RendererBuilder, source: &str) -> String {
    let parser = ParserBuilder::with_defaults(&Config::default().parser).build();
    let renderer = builder.build(parser.kinds().clone()).unwrap();
    let doc = parser.parse(source);
    let mut out = Vec::new();
    renderer.render(&mut out, source, &doc).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_lower_priority_renderer_wins() {
    let mut builder = RendererBuilder::html(Default::default());
    builder.add_node_renderer(Italic, 10);
    similar_asserts::assert_eq!(render_html(builder, "*a* **b**"), "<p><i>a</i> <i>b</i></p>\n");
}

#[test]
fn test_higher_priority_renderer_is_shadowed() {
    let mut builder = RendererBuilder::html(Default::default());
    builder.add_node_renderer(Italic, 2000);
    similar_asserts::assert_eq!(render_html(builder, "*a*"), "<p><em>a</em></p>\n");
}

struct Star;

impl InlineParser for Star {
    fn trigger(&self) -> &[u8] {
        b"*"
    }

    fn parse(&self, doc: &mut Document, _parent: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) -> Option<NodeId> {
        reader.advance(1);
        Some(doc.new_node(
            Kind::STRING,
            NodeData::String {
                value: "+".to_string(),
                raw: true,
            },
        ))
    }
}

#[test]
fn test_lower_priority_inline_parser_wins() {
    let mut builder = ParserBuilder::with_defaults(&Config::default().parser);
    builder.add_inline_parser(Star, 10);
    let parser = builder.build();
    let renderer = RendererBuilder::html(Default::default())
        .build(parser.kinds().clone())
        .unwrap();

    let source = "*a*";
    let doc = parser.parse(source);
    let mut out = Vec::new();
    renderer.render(&mut out, source, &doc).unwrap();
    similar_asserts::assert_eq!(String::from_utf8(out).unwrap(), "<p>+a+</p>\n");
}

struct Caret {
    kind: Kind,
}

impl InlineParser for Caret {
    fn trigger(&self) -> &[u8] {
        b"^"
    }

    fn parse(&self, doc: &mut Document, _parent: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) -> Option<NodeId> {
        reader.advance(1);
        Some(doc.new_node(self.kind, NodeData::Extension))
    }
}

struct Shout;

impl Extension for Shout {
    fn name(&self) -> &'static str {
        "Shout"
    }

    fn extend_parser(&self, builder: &mut ParserBuilder) -> Result<(), ConfigError> {
        let kind = builder.register_kind("Shout", NodeType::Inline)?;
        builder.add_inline_parser(Caret { kind }, 100);
        Ok(())
    }

    fn extend_renderer(&self, _builder: &mut RendererBuilder) -> Result<(), ConfigError> {
        Ok(())
    }
}

#[test]
fn test_missing_renderer_is_an_error() {
    let extensions: Vec<Box<dyn Extension>> = vec![Box::new(Shout)];
    let markdown = Markdown::with_extensions(&Config::default(), &extensions).unwrap();
    assert!(!markdown.renderer().has_renderer(markdown.parser().kinds().require("Shout").unwrap()));

    let mut out = Vec::new();
    let err = markdown.convert("a ^ b", &mut out).unwrap_err();
    assert!(matches!(&err, RenderError::MissingRenderer { kind } if kind == "Shout"));
    assert_eq!(err.to_string(), "no renderer registered for node kind Shout");

    // Documents without the kind still render.
    let mut out = Vec::new();
    markdown.convert("plain", &mut out).unwrap();
    assert_eq!(out, b"<p>plain</p>\n");
}

#[test]
fn test_duplicate_kind_is_rejected() {
    let mut builder = ParserBuilder::new();
    assert_eq!(
        builder.register_kind("Paragraph", NodeType::Block),
        Err(ConfigError::DuplicateKind("Paragraph".to_string()))
    );
    builder.register_kind("Shout", NodeType::Inline).unwrap();
    assert_eq!(
        builder.register_kind("Shout", NodeType::Inline),
        Err(ConfigError::DuplicateKind("Shout".to_string()))
    );
}

#[test]
fn test_duplicate_extension_is_rejected() {
    let extensions: Vec<Box<dyn Extension>> = vec![Box::new(Strikethrough), Box::new(TaskList), Box::new(Strikethrough)];
    let Err(err) = Markdown::with_extensions(&Config::default(), &extensions) else {
        panic!("duplicate extension accepted");
    };
    assert_eq!(err, ConfigError::DuplicateExtension("Strikethrough".to_string()));
}

#[test]
fn test_renderer_for_unknown_kind_is_rejected() {
    let parser = ParserBuilder::with_defaults(&Config::default().parser).build();
    let mut builder = RendererBuilder::html(Default::default());
    Strikethrough.extend_renderer(&mut builder).unwrap();
    let Err(err) = builder.build(parser.kinds().clone()) else {
        panic!("unknown kind accepted");
    };
    assert_eq!(err, ConfigError::UnknownKind("Strikethrough".to_string()));
}

#[test]
fn test_parser_is_reusable_across_threads() {
    let markdown = std::sync::Arc::new(markdown(OutputFormat::Html));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let markdown = std::sync::Arc::clone(&markdown);
            std::thread::spawn(move || {
                let mut out = Vec::new();
                markdown.convert(&format!("~~{}~~", i), &mut out).unwrap();
                String::from_utf8(out).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("<p><del>{}</del></p>\n", i));
    }
}

struct BrokenSink;

impl std::io::Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("disk full"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_sink_failure_is_an_io_error() {
    for format in [OutputFormat::Html, OutputFormat::Markdown] {
        let markdown = markdown(format);
        let err = markdown.convert("# a\n", &mut BrokenSink).unwrap_err();
        assert!(matches!(&err, RenderError::Io(e) if e.to_string() == "disk full"), "{:?}", err);
        assert!(std::error::Error::source(&err).is_some());
    }

    let Err(err) = markweave::convert("a\n", &mut BrokenSink, &Config::default()) else {
        panic!("write error swallowed");
    };
    assert!(matches!(err, markweave::Error::Render(RenderError::Io(_))), "{:?}", err);
}

#[test]
fn test_document_from_differently_extended_parser_is_rejected() {
    let extensions: Vec<Box<dyn Extension>> = vec![Box::new(Shout)];
    let shouting = Markdown::with_extensions(&Config::default(), &extensions).unwrap();
    let plain = Markdown::new(&Config::default()).unwrap();

    let doc = shouting.parse("a ^ b\n");
    let mut out = Vec::new();
    let err = plain.render(&mut out, "a ^ b\n", &doc).unwrap_err();
    assert!(matches!(err, RenderError::KindMismatch), "{:?}", err);

    // Pipelines built from the same configuration agree on their kinds.
    let other = Markdown::new(&Config::default()).unwrap();
    let doc = other.parse("*a*\n");
    let mut out = Vec::new();
    plain.render(&mut out, "*a*\n", &doc).unwrap();
    assert_eq!(out, b"<p><em>a</em></p>\n");
}
