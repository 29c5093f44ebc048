//! Optional syntax packaged as units that add kinds, parsers and renderers.

pub mod strikethrough;
pub mod tasklist;

use std::collections::HashSet;

use crate::config::ExtensionsConfig;
use crate::error::ConfigError;
use crate::parser::ParserBuilder;
use crate::renderer::RendererBuilder;

pub use strikethrough::Strikethrough;
pub use tasklist::TaskList;

/// A bundle of parser and renderer additions.
///
/// `extend_parser` runs first and registers any new kinds; `extend_renderer`
/// then resolves those kinds by name when the renderer is built.
pub trait Extension {
    /// Unique name, used to reject adding the same extension twice.
    fn name(&self) -> &'static str;

    fn extend_parser(&self, builder: &mut ParserBuilder) -> Result<(), ConfigError>;

    fn extend_renderer(&self, builder: &mut RendererBuilder) -> Result<(), ConfigError>;
}

/// The extensions `config` turns on.
pub fn from_config(config: &ExtensionsConfig) -> Vec<Box<dyn Extension>> {
    let mut extensions: Vec<Box<dyn Extension>> = Vec::new();
    if config.strikethrough {
        extensions.push(Box::new(Strikethrough));
    }
    if config.task_list {
        extensions.push(Box::new(TaskList));
    }
    extensions
}

/// Applies `extensions` in order to both builders.
pub fn apply(
    extensions: &[Box<dyn Extension>],
    parser: &mut ParserBuilder,
    renderer: &mut RendererBuilder,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for extension in extensions {
        if !seen.insert(extension.name()) {
            return Err(ConfigError::DuplicateExtension(extension.name().to_string()));
        }
        log::debug!("Applying extension {}", extension.name());
        extension.extend_parser(parser)?;
        extension.extend_renderer(renderer)?;
    }
    Ok(())
}
