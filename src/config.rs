use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Which renderer [`crate::convert`] uses.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Html,
    /// Markdown again, normalized by the round-trip renderer.
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Options of the parsing pipeline.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ParserConfig {
    /// Give every heading an `id` attribute derived from its text.
    pub auto_heading_id: bool,
    /// Recognize trailing `{#id .class key=value}` on ATX headings.
    pub attribute: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RendererConfig {
    pub format: OutputFormat,
    /// Emit raw HTML and potentially dangerous URLs as written.
    pub unsafe_html: bool,
    /// Self-close void elements (`<br />`).
    pub xhtml: bool,
    /// Render soft line breaks as `<br>`.
    pub hard_wraps: bool,
}

/// Optional syntax beyond CommonMark.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ExtensionsConfig {
    /// `~~deleted~~`
    pub strikethrough: bool,
    /// `- [x] done` checkboxes in list items.
    pub task_list: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub renderer: RendererConfig,
    pub extensions: ExtensionsConfig,
}

#[derive(Default, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn auto_heading_id(mut self, enabled: bool) -> Self {
        self.config.parser.auto_heading_id = enabled;
        self
    }

    pub fn attribute(mut self, enabled: bool) -> Self {
        self.config.parser.attribute = enabled;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.renderer.format = format;
        self
    }

    pub fn unsafe_html(mut self, enabled: bool) -> Self {
        self.config.renderer.unsafe_html = enabled;
        self
    }

    pub fn xhtml(mut self, enabled: bool) -> Self {
        self.config.renderer.xhtml = enabled;
        self
    }

    pub fn hard_wraps(mut self, enabled: bool) -> Self {
        self.config.renderer.hard_wraps = enabled;
        self
    }

    pub fn strikethrough(mut self, enabled: bool) -> Self {
        self.config.extensions.strikethrough = enabled;
        self
    }

    pub fn task_list(mut self, enabled: bool) -> Self {
        self.config.extensions.task_list = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

const CANDIDATE_NAMES: &[&str] = &[".markweave.toml", "markweave.toml"];

fn parse_config_str(s: &str, path: &Path) -> io::Result<Config> {
    toml::from_str::<Config>(s).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid config {}: {e}", path.display()),
        )
    })
}

fn read_config(path: &Path) -> io::Result<Config> {
    log::debug!("Reading config from: {}", path.display());
    let s = fs::read_to_string(path)?;
    let config = parse_config_str(&s, path)?;
    log::info!("Loaded config from: {}", path.display());
    Ok(config)
}

fn find_in_tree(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        for name in CANDIDATE_NAMES {
            let p = dir.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
    }
    None
}

fn xdg_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let p = Path::new(&xdg).join("markweave").join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }
    if let Ok(home) = env::var("HOME") {
        let p = Path::new(&home)
            .join(".config")
            .join("markweave")
            .join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }
    None
}

/// Load configuration with precedence:
/// 1) explicit path (error if unreadable/invalid)
/// 2) walk up from start_dir: .markweave.toml, markweave.toml
/// 3) XDG: $XDG_CONFIG_HOME/markweave/config.toml or ~/.config/markweave/config.toml
/// 4) default config
pub fn load(explicit: Option<&Path>, start_dir: &Path) -> io::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let cfg = read_config(path)?;
        return Ok((cfg, Some(path.to_path_buf())));
    }

    if let Some(p) = find_in_tree(start_dir)
        && let Ok(cfg) = read_config(&p)
    {
        return Ok((cfg, Some(p)));
    }

    if let Some(p) = xdg_config_path()
        && let Ok(cfg) = read_config(&p)
    {
        return Ok((cfg, Some(p)));
    }

    log::debug!("No config file found, using defaults");
    Ok((Config::default(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let cfg = toml::from_str::<Config>("[renderer]\nformat = \"markdown\"\n").unwrap();
        assert_eq!(cfg.renderer.format, OutputFormat::Markdown);
        assert!(!cfg.renderer.unsafe_html);
        assert_eq!(cfg.parser, ParserConfig::default());
    }

    #[test]
    fn test_full_config() {
        let toml_str = r#"
            [parser]
            auto_heading_id = true
            attribute = true

            [renderer]
            unsafe_html = true
            xhtml = true
            hard_wraps = true

            [extensions]
            strikethrough = true
            task_list = true
        "#;
        let cfg = toml::from_str::<Config>(toml_str).unwrap();
        let expected = ConfigBuilder::default()
            .auto_heading_id(true)
            .attribute(true)
            .unsafe_html(true)
            .xhtml(true)
            .hard_wraps(true)
            .strikethrough(true)
            .task_list(true)
            .build();
        assert_eq!(cfg, expected);
    }

    #[test]
    fn test_invalid_config_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markweave.toml");
        fs::write(&path, "[renderer]\nformat = \"pdf\"\n").unwrap();
        let err = load(Some(&path), dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_found_walking_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".markweave.toml"), "[parser]\nattribute = true\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let (cfg, path) = load(None, &nested).unwrap();
        assert!(cfg.parser.attribute);
        assert_eq!(path, Some(dir.path().join(".markweave.toml")));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("md".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
