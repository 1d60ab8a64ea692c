//! CLI tool for rendering a JSON deck definition into a PowerPoint file.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deck_core::DeckDefinition;
use std::path::PathBuf;
use std::process::ExitCode;

const SAMPLE_DECK: &str = include_str!("../assets/sample_deck.json");

/// Render a deck definition (JSON) to a .pptx file.
#[derive(Parser, Debug)]
#[command(name = "deck-generate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deck definition file (.json)
    input: Option<PathBuf>,

    /// Render the built-in roadmap sample deck instead of a file
    #[arg(long, conflicts_with = "input")]
    sample: bool,

    /// Output PowerPoint file
    #[arg(short, long, default_value = "deck_output.pptx")]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(&args) {
        Ok(slides) => {
            println!("Saved: {}", args.output.display());
            println!("Slides: {}", slides);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load the definition, render it and write the output. Returns the slide count.
fn run(args: &Args) -> Result<usize> {
    let json = match (&args.input, args.sample) {
        (_, true) => SAMPLE_DECK.to_string(),
        (Some(path), false) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, false) => bail!("No deck definition given; pass a JSON file or --sample"),
    };

    let deck = DeckDefinition::from_json(&json).context("Invalid deck definition")?;
    let slides = deck.resolved_slides().len();
    log::debug!("Rendering {} slides", slides);

    deck_pptx::generate_to_path(&deck, &args.output)
        .with_context(|| format!("Could not generate {}", args.output.display()))?;
    Ok(slides)
}
