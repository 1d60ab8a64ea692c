//! CLI tool for analyzing a local PowerPoint file into JSON.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::{snippet, ElementCounts, PresentationAnalysis};
use deck_pptx::{AnalyzeOptions, PptxAnalyzer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_OUTPUT_NAME: &str = "analysis_output.json";

/// Analyze a .pptx file and write a per-slide JSON summary.
#[derive(Parser, Debug)]
#[command(name = "deck-analyze")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    #[arg(default_value = "mock-proposal.pptx")]
    input: PathBuf,

    /// Output JSON file (default: analysis_output.json next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full JSON to stdout instead of a preview
    #[arg(short, long)]
    print: bool,

    /// Number of characters shown in the console preview
    #[arg(long, default_value = "1000")]
    preview_chars: usize,

    /// Skip speaker notes
    #[arg(long)]
    no_notes: bool,

    /// Skip reading workbooks embedded behind charts
    #[arg(long)]
    no_workbooks: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(&args, &mut std::io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Analyze, write the output file, then preview the JSON on `console`.
fn run(args: &Args, console: &mut impl Write) -> Result<()> {
    let analyzer = PptxAnalyzer::with_options(AnalyzeOptions {
        include_notes: !args.no_notes,
        include_workbooks: !args.no_workbooks,
    });

    eprintln!("Analyzing: {}", args.input.display());
    let analysis = analyzer
        .analyze_path(&args.input)
        .with_context(|| format!("Could not analyze {}", args.input.display()))?;

    if args.verbose {
        let counts = ElementCounts::of(&analysis);
        eprintln!(
            "  Found {} slides: {} text blocks, {} tables, {} charts, {} images",
            analysis.slide_count, counts.text, counts.tables, counts.charts, counts.images
        );
    }

    let json = serde_json::to_string_pretty(&analysis).context("Failed to serialize analysis")?;

    let output_path = get_output_path(&args.input, args.output.as_deref());
    write_output(&output_path, &json)?;
    eprintln!("Written to: {}", output_path.display());

    print_preview(console, &analysis, &json, args);

    Ok(())
}

/// Print the JSON (or its head) to the console. Console failures are not
/// fatal: the full result is already on disk.
fn print_preview(
    console: &mut impl Write,
    analysis: &PresentationAnalysis,
    json: &str,
    args: &Args,
) {
    let text = if args.print || json.chars().count() <= args.preview_chars {
        json.to_string()
    } else {
        format!(
            "{}\n(truncated, see the output file for all {} slides)",
            snippet(json, args.preview_chars),
            analysis.slide_count
        )
    };

    if let Err(e) = writeln!(console, "{}", text).and_then(|_| console.flush()) {
        log::warn!("Failed to print JSON: {}", e);
        eprintln!(
            "Could not print the result to the console ({}); redirect stdout to a file or read the output file instead.",
            e
        );
    }
}

/// Determine the output path for the analysis.
fn get_output_path(input_path: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => match input_path.parent() {
            Some(parent) => parent.join(DEFAULT_OUTPUT_NAME),
            None => PathBuf::from(DEFAULT_OUTPUT_NAME),
        },
    }
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
