use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use similar::{ChangeTag, TextDiff};

use markweave::config::Config;
use markweave::testutil::{NodeRef, compare_structure, default_node_assertions};
use markweave::{Markdown, OutputFormat};

mod cli;
use cli::{Cli, Commands};

fn read_all(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn start_dir_for(input_path: &Option<PathBuf>) -> io::Result<PathBuf> {
    if let Some(p) = input_path {
        Ok(p.parent().unwrap_or(Path::new(".")).to_path_buf())
    } else {
        std::env::current_dir()
    }
}

fn load_config(explicit: Option<&Path>, file: &Option<PathBuf>) -> io::Result<Config> {
    let start_dir = start_dir_for(file)?;
    let (cfg, cfg_path) = markweave::config::load(explicit, &start_dir)?;
    if let Some(path) = &cfg_path {
        log::debug!("Using config from: {}", path.display());
    } else {
        log::debug!("Using default config");
    }
    Ok(cfg)
}

fn build(config: &Config) -> io::Result<Markdown> {
    Markdown::new(config).map_err(|e| io::Error::from(markweave::Error::from(e)))
}

fn print_diff(file_path: &str, original: &str, roundtripped: &str) {
    let diff = TextDiff::from_lines(original, roundtripped);

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            println!("---");
        }

        println!("Tree drift in {}:{}:", file_path, group[0].old_range().start + 1);

        for op in group {
            for change in diff.iter_changes(op) {
                let (sign, style) = match change.tag() {
                    ChangeTag::Delete => ("-", "\x1b[31m"), // red
                    ChangeTag::Insert => ("+", "\x1b[32m"), // green
                    ChangeTag::Equal => (" ", "\x1b[0m"),
                };

                print!("{}{}{}", style, sign, change.value());

                if change.tag() != ChangeTag::Equal {
                    print!("\x1b[0m");
                }
            }
        }
    }
}

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { file, to } => {
            let mut cfg = load_config(cli.config.as_deref(), &file)?;
            if let Some(format) = to {
                cfg.renderer.format = format;
            }
            let markdown = build(&cfg)?;
            let input = read_all(file.as_ref())?;

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            markdown
                .convert(&input, &mut out)
                .map_err(|e| io::Error::from(markweave::Error::from(e)))?;
            out.flush()
        }
        Commands::Parse { file } => {
            let cfg = load_config(cli.config.as_deref(), &file)?;
            let markdown = build(&cfg)?;
            let input = read_all(file.as_ref())?;
            let doc = markdown.parse(&input);
            print!("{}", doc.dump(&input));
            Ok(())
        }
        Commands::Roundtrip { file, check } => {
            let mut cfg = load_config(cli.config.as_deref(), &file)?;
            cfg.renderer.format = OutputFormat::Markdown;
            let markdown = build(&cfg)?;
            let input = read_all(file.as_ref())?;

            let original = markdown.parse(&input);
            let mut rendered = Vec::new();
            markdown
                .render(&mut rendered, &input, &original)
                .map_err(|e| io::Error::from(markweave::Error::from(e)))?;
            let output = String::from_utf8_lossy(&rendered).into_owned();

            if !check {
                print!("{output}");
                return Ok(());
            }

            let reparsed = markdown.parse(&output);
            let result = compare_structure(
                NodeRef::root(&original, &input),
                NodeRef::root(&reparsed, &output),
                &default_node_assertions(),
            );
            match result {
                Ok(()) => {
                    if file.is_some() {
                        println!("Round trip is stable");
                    }
                    Ok(())
                }
                Err(message) => {
                    let file_name = file.as_ref().and_then(|p| p.to_str()).unwrap_or("<stdin>");
                    eprintln!("Error: {}", message);
                    print_diff(file_name, &original.dump(&input), &reparsed.dump(&output));
                    std::process::exit(1);
                }
            }
        }
    }
}
