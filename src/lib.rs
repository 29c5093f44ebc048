pub mod ast;
pub mod config;
pub mod error;
pub mod extension;
pub mod parser;
pub mod renderer;
pub mod testutil;
pub mod text;
pub mod utils;

use std::io::Write;

pub use ast::{Document, Kind, KindRegistry, NodeData, NodeId};
pub use config::{Config, ConfigBuilder, OutputFormat};
pub use error::{ConfigError, Error};
pub use extension::Extension;
pub use parser::{Parser, ParserBuilder};
pub use renderer::{RenderError, Renderer, RendererBuilder};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A parser and a renderer built from the same configuration.
///
/// Both halves are immutable once built, so one `Markdown` can convert any
/// number of documents, from several threads at once.
///
/// # Examples
///
/// ```rust
/// use markweave::{ConfigBuilder, Markdown};
///
/// let config = ConfigBuilder::default().strikethrough(true).build();
/// let markdown = Markdown::new(&config).unwrap();
/// let mut out = Vec::new();
/// markdown.convert("~~old~~ *new*", &mut out).unwrap();
/// assert_eq!(out, b"<p><del>old</del> <em>new</em></p>\n");
/// ```
pub struct Markdown {
    parser: Parser,
    renderer: Renderer,
}

impl Markdown {
    /// Builds the pipeline `config` describes, including the extensions it
    /// enables.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Self::with_extensions(config, &extension::from_config(&config.extensions))
    }

    /// Builds the pipeline with an explicit list of extensions instead of the
    /// ones named in `config.extensions`.
    pub fn with_extensions(config: &Config, extensions: &[Box<dyn Extension>]) -> Result<Self, ConfigError> {
        let mut parser = ParserBuilder::with_defaults(&config.parser);
        let mut renderer = RendererBuilder::from_config(&config.renderer);
        extension::apply(extensions, &mut parser, &mut renderer)?;
        let parser = parser.build();
        let renderer = renderer.build(std::sync::Arc::clone(parser.kinds()))?;
        Ok(Self { parser, renderer })
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn parse(&self, source: &str) -> Document {
        self.parser.parse(source)
    }

    pub fn render(&self, sink: &mut impl Write, source: &str, doc: &Document) -> Result<(), RenderError> {
        render(sink, source, doc, &self.renderer)
    }

    pub fn convert(&self, source: &str, sink: &mut impl Write) -> Result<(), RenderError> {
        let doc = self.parse(source);
        self.render(sink, source, &doc)
    }
}

/// Parses a Markdown document into a tree.
///
/// Parsing never fails; anything that is not a recognized construct is kept
/// as text. Extensions enabled in `config` take part. Builds a fresh [`Parser`] each call, so prefer [`Markdown`] or a
/// prebuilt [`Parser`] for many documents.
///
/// # Examples
///
/// ```rust
/// use markweave::{Config, parse};
///
/// let source = "# Heading\n\nParagraph text.";
/// let doc = parse(source, &Config::default());
/// println!("{}", doc.dump(source));
/// ```
pub fn parse(source: &str, config: &Config) -> Document {
    #[cfg(debug_assertions)]
    {
        init_logger();
    }
    ParserBuilder::from_config(config).build().parse(source)
}

/// Renders `doc`, parsed from `source`, into `sink`.
pub fn render(sink: &mut impl Write, source: &str, doc: &Document, renderer: &Renderer) -> Result<(), RenderError> {
    renderer.render(sink, source, doc)
}

/// Parses `source` and renders it in the format `config` selects.
pub fn convert(source: &str, sink: &mut impl Write, config: &Config) -> Result<(), Error> {
    #[cfg(debug_assertions)]
    {
        init_logger();
    }
    let markdown = Markdown::new(config)?;
    markdown.convert(source, sink)?;
    Ok(())
}
