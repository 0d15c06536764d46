use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use chatmark_core::parse;

mod config;

use config::load_catalog;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Most verbose
    Trace,
    /// Verbose: per-step reparse counts, dropped payloads
    Debug,
    /// Standard
    Info,
    /// Quiet: only warnings and errors
    Warn,
    /// Minimal: only errors
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "chatmark")]
#[command(author, version, about = "Parse assistant transcripts into segments and match command templates", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a transcript into segments and print them as JSON
    Segments {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,

        /// Print compact JSON instead of pretty
        #[arg(long)]
        compact: bool,

        /// Re-parse the growing buffer after every line, the way a streaming
        /// consumer would
        #[arg(long)]
        stream: bool,
    },

    /// Match text against a command's templates and print the bindings
    Match {
        /// Catalog TOML file
        #[arg(long)]
        catalog: PathBuf,

        /// Command whose templates to try
        #[arg(long)]
        command: String,

        /// Text to match; stdin when omitted
        text: Option<String>,
    },

    /// List the templates in a catalog
    Templates {
        /// Catalog TOML file
        #[arg(long)]
        catalog: PathBuf,

        /// Limit to one command
        #[arg(long)]
        command: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::new(cli.log_level.as_filter());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Segments {
            file,
            compact,
            stream,
        } => segments_command(file.as_deref(), compact, stream),
        Commands::Match {
            catalog,
            command,
            text,
        } => match_command(&catalog, &command, text),
        Commands::Templates { catalog, command } => templates_command(&catalog, command.as_deref()),
    }
}

fn read_input(file: Option<&std::path::Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {:?}", path)),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn segments_command(file: Option<&std::path::Path>, compact: bool, stream: bool) -> Result<()> {
    let buffer = read_input(file)?;

    if stream {
        // parse the whole buffer again after each line, as a UI consuming a
        // streamed response does; every intermediate parse must succeed
        let mut grown = String::new();
        for (index, line) in buffer.lines().enumerate() {
            grown.push_str(line);
            grown.push('\n');
            let segments = parse(&grown);
            tracing::debug!(lines = index + 1, segments = segments.len(), "reparsed");
        }
    }

    let segments = parse(&buffer);
    let json = if compact {
        serde_json::to_string(&segments)?
    } else {
        serde_json::to_string_pretty(&segments)?
    };
    println!("{json}");
    Ok(())
}

fn match_command(catalog_path: &std::path::Path, command: &str, text: Option<String>) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let text = match text {
        Some(text) => text,
        None => read_input(None)?,
    };
    let text = text.trim_end_matches('\n');

    match catalog.match_text(command, text)? {
        Some(matched) => {
            let json = serde_json::json!({
                "template": matched.template.id,
                "bindings": matched.bindings,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(())
        }
        None => {
            eprintln!("no template of command '{command}' matches");
            std::process::exit(1);
        }
    }
}

fn templates_command(catalog_path: &std::path::Path, command: Option<&str>) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;

    let commands: Vec<&str> = match command {
        Some(name) => {
            if !catalog.contains_command(name) {
                anyhow::bail!("unknown command: {name}");
            }
            vec![name]
        }
        None => catalog.commands(),
    };

    for name in commands {
        println!("{name}:");
        for template in catalog.templates_for(name) {
            println!("  {}: {}", template.id, template.text);
            for placeholder in &template.placeholders {
                let mode = if placeholder.multiline {
                    "multiline"
                } else {
                    "single-line"
                };
                println!("    {} = {} ({mode})", placeholder.id, placeholder.marker);
            }
        }
    }
    Ok(())
}
