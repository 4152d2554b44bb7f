//! CLI tool for extracting tagging records from PowerPoint tagging guides.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tagging_core::{
    spawn_extraction, ExportFormat, ExtractionEvent, ExtractionOutcome, ExtractorConfig,
    GroupingStrategy, RecordWriter, Severity,
};
use tagging_pptx::PptxParser;

/// Extract analytics tagging records from tagging-guide tables in PowerPoint files.
#[derive(Parser, Debug)]
#[command(name = "tagging-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print records to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// How to find the header row and the "No." column of tagging tables
    #[arg(short, long, value_enum, default_value_t = Strategy::HeaderScan)]
    strategy: Strategy,

    /// Text shapes at most this many points from the top may be slide titles
    #[arg(short, long, default_value_t = tagging_core::config::DEFAULT_TITLE_THRESHOLD_PT)]
    title_threshold: f64,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    HeaderScan,
    IndexedHeader,
}

impl From<Strategy> for GroupingStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::HeaderScan => GroupingStrategy::HeaderScan,
            Strategy::IndexedHeader => GroupingStrategy::IndexedHeader,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = ExtractorConfig::new()
        .with_strategy(args.strategy.into())
        .with_title_threshold(args.title_threshold);
    let writer = RecordWriter::new(args.format.into());

    for input_path in &args.input {
        if !args.quiet {
            eprintln!("Processing: {}", input_path.display());
        }

        match process_file(input_path, &args, &config) {
            Ok(outcome) if outcome.is_empty() => {
                eprintln!("No tagging data extracted from {}", input_path.display());
            }
            Ok(outcome) => {
                if args.print {
                    let stdout = io::stdout();
                    writer
                        .write(&outcome.records, stdout.lock())
                        .context("Failed to write records to stdout")?;
                } else {
                    let output_path =
                        get_output_path(input_path, args.output.as_ref(), writer.format())?;
                    write_output(&output_path, &writer, &outcome)?;
                    if !args.quiet {
                        eprintln!(
                            "Written {} records to: {}",
                            outcome.len(),
                            output_path.display()
                        );
                    }
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    Ok(())
}

/// Extract one file on a worker thread, relaying its events to stderr.
fn process_file(
    input_path: &Path,
    args: &Args,
    config: &ExtractorConfig,
) -> Result<ExtractionOutcome> {
    let started = Instant::now();
    let path = input_path.to_path_buf();

    let handle = spawn_extraction(move || PptxParser::new().open_path(&path), config.clone())
        .context("Failed to start extraction worker")?;

    let mut last_reported = 0;
    for event in handle.events().iter() {
        match event {
            ExtractionEvent::Diagnostic(d) => {
                let important = matches!(d.severity, Severity::Warning | Severity::Error);
                if important || !args.quiet {
                    eprintln!("{}", d);
                }
            }
            ExtractionEvent::Progress(p) => {
                if args.verbose && p >= last_reported + 10 {
                    eprintln!("  progress: {}%", p);
                    last_reported = p - p % 10;
                }
            }
        }
    }

    let outcome = handle
        .join()
        .with_context(|| format!("Failed to extract {}", input_path.display()))?;

    if args.verbose {
        let stats = &outcome.stats;
        eprintln!(
            "  {} slides ({} skipped), {} tables ({} tagging, {} skipped), {} rows skipped",
            stats.slides,
            stats.slides_skipped,
            stats.tables,
            stats.tagging_tables,
            stats.tables_skipped,
            stats.rows_skipped
        );
        eprintln!("  Elapsed: {:.3}s", started.elapsed().as_secs_f64());
    }

    Ok(outcome)
}

/// Determine the output path for a processed file.
fn get_output_path(
    input_path: &Path,
    output_dir: Option<&PathBuf>,
    format: ExportFormat,
) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}_tagging.{}", stem, format.extension());

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write records to a file.
fn write_output(path: &Path, writer: &RecordWriter, outcome: &ExtractionOutcome) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writer
        .write(&outcome.records, &mut out)
        .with_context(|| format!("Failed to write to {}", path.display()))?;
    out.flush()
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
