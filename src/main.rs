use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use listicle::{Config, RichText, Segmenter};

#[derive(Parser)]
#[command(name = "listicle")]
#[command(about = "Split CMS rich-text articles into the listicle golden layout")]
struct Cli {
    /// TOML config file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a rich-text JSON (or Markdown) document and print the result as JSON
    Segment {
        /// Input document, `-` for stdin
        input: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
    /// List top-level blocks with their list-item classification
    Inspect {
        /// Input document, `-` for stdin
        input: PathBuf,
    },
    /// Render the segmented document as Markdown with image placeholders
    Preview {
        /// Input document, `-` for stdin
        input: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert Markdown into a rich-text JSON document
    Convert {
        /// Input Markdown file, `-` for stdin
        input: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::compiled_default(),
    };

    match cli.command {
        Commands::Segment {
            input,
            output,
            pretty,
        } => {
            let document = read_document(&input)?;
            let segmentation = Segmenter::new(&config).segment(document.as_ref());
            let json = to_json(&segmentation, pretty)?;
            write_output(output.as_deref(), &json)
        }
        Commands::Inspect { input } => {
            let document = read_document(&input)?;
            let Some(blocks) = document.as_ref().and_then(RichText::blocks) else {
                println!("document has no block content");
                return Ok(());
            };
            for (i, block) in blocks.iter().enumerate() {
                let marker = match listicle::classify(block) {
                    Some(listicle::ListMarker::Numbered) => "numbered",
                    Some(listicle::ListMarker::BoldLead) => "bold-lead",
                    None => "-",
                };
                let text: String = listicle::plain_text(block).chars().take(60).collect();
                println!("{:>4}  {:24} {:10} {}", i, block.node_type(), marker, text.trim());

                let packed = listicle::count_inline_items(block);
                if packed >= 2 {
                    println!("      ^ {packed} numbered items in one paragraph (not split)");
                }
            }
            let segmentation = Segmenter::new(&config).segment(document.as_ref());
            println!(
                "list items: {}, listicle: {}",
                segmentation.list_item_count, segmentation.is_listicle
            );
            for range in segmentation.dropped_ranges() {
                println!("not placed in any section: blocks {}..{}", range.start, range.end);
            }
            Ok(())
        }
        Commands::Preview { input, output } => {
            let document = read_document(&input)?;
            let markdown = listicle::markdown_preview_with_config(document.as_ref(), &config);
            write_output(output.as_deref(), &markdown)
        }
        Commands::Convert {
            input,
            output,
            pretty,
        } => {
            let markdown = read_input(&input)?;
            let document = listicle::parse_markdown(&markdown);
            let json = to_json(&document, pretty)?;
            write_output(output.as_deref(), &json)
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Error reading stdin")?;
        return Ok(content);
    }
    fs::read_to_string(path).with_context(|| format!("Error reading {}", path.display()))
}

/// Markdown files are converted, everything else is parsed as rich-text JSON.
fn read_document(path: &Path) -> anyhow::Result<Option<RichText>> {
    let content = read_input(path)?;
    let is_markdown = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "md" | "markdown"));
    if is_markdown {
        return Ok(Some(listicle::parse_markdown(&content)));
    }
    listicle::parse_json(&content).with_context(|| format!("Error parsing {}", path.display()))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Error writing {}", path.display()))?;
            eprintln!("Created {}", path.display());
        }
        None => println!("{}", content.trim_end()),
    }
    Ok(())
}
