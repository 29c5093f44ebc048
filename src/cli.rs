use clap::{Parser, Subcommand};
use std::path::PathBuf;

use markweave::OutputFormat;

#[derive(Parser)]
#[command(name = "markweave")]
#[command(author, version)]
#[command(about = "Convert CommonMark documents to HTML or normalized Markdown")]
#[command(after_help = "\
EXAMPLES:

    # Convert a file to HTML
    markweave convert README.md

    # Convert from stdin to normalized Markdown
    cat README.md | markweave convert --to markdown

    # Inspect the parsed tree
    markweave parse README.md

    # Check that Markdown output re-parses to the same tree
    markweave roundtrip --check README.md

CONFIGURATION:

markweave looks for configuration files in this order:
  1. Explicit --config path
  2. markweave.toml or .markweave.toml in current/parent directories
  3. ~/.config/markweave/config.toml (XDG)
  4. Built-in defaults

Example .markweave.toml:

    [parser]
    auto_heading_id = true

    [renderer]
    unsafe_html = true

    [extensions]
    strikethrough = true
    task_list = true")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, global = true)]
    #[arg(
        long_help = "Path to a custom configuration file. If not specified, markweave will \
        search for .markweave.toml or markweave.toml next to the input and in its parents, \
        then fall back to ~/.config/markweave/config.toml."
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a document to HTML or Markdown
    #[command(after_help = "\
EXAMPLES:

    # HTML to stdout
    markweave convert document.md

    # Markdown, overriding the configured format
    markweave convert --to markdown document.md")]
    Convert {
        /// Input file (stdin if not provided)
        file: Option<PathBuf>,

        /// Output format, overriding the configuration
        #[arg(long, value_name = "FORMAT")]
        to: Option<OutputFormat>,
    },

    /// Print the parsed document tree
    Parse {
        /// Input file (stdin if not provided)
        file: Option<PathBuf>,
    },

    /// Render a document back to Markdown
    #[command(
        long_about = "Render a document back to Markdown. With --check, the output is parsed \
        again and compared to the original tree; any structural difference is printed as a \
        diff of the two tree dumps and the command exits with code 1."
    )]
    Roundtrip {
        /// Input file (stdin if not provided)
        file: Option<PathBuf>,

        /// Fail if the output does not parse to the same tree
        #[arg(long)]
        check: bool,
    },
}
