//! # CLI Module
//!
//! The request boundary for the comparison engine.
//!
//! ## Usage
//! ```bash
//! # Compare two local images
//! imgsim compare a.jpg b.jpg --method phash
//!
//! # Compare a remote image against a local one
//! imgsim compare https://example.com/a.jpg b.jpg --method orb
//!
//! # JSON output
//! imgsim compare a.jpg b.jpg --method hist --output json
//!
//! # Per-method statistics over every stored comparison
//! imgsim stats
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use image_similarity::core::store::MethodStats;
use image_similarity::core::{Comparator, Method, SqliteStore};
use image_similarity::error::{Result, SimilarityError};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Image similarity - compare two images, cache every score
#[derive(Parser, Debug)]
#[command(name = "imgsim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two images by local path or URL
    Compare {
        /// First image (path or http(s) URL)
        locator1: String,

        /// Second image (path or http(s) URL)
        locator2: String,

        /// Comparison method
        #[arg(short, long, default_value = "orb")]
        method: MethodArg,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Store database path
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Show per-method statistics over all stored comparisons
    Stats {
        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Store database path
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    /// Keypoint matching - robust to scale and rotation, slowest
    Orb,
    /// Histogram correlation - fast global filter
    Hist,
    /// Perceptual hash - robust to recompression and resizing
    Phash,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Orb => Method::Keypoint,
            MethodArg::Hist => Method::Histogram,
            MethodArg::Phash => Method::Perceptual,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    input1: &'a str,
    input2: &'a str,
    method: Method,
    similarity_score: f64,
}

/// Run the CLI
pub fn run() -> Result<()> {
    image_similarity::init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Compare {
            locator1,
            locator2,
            method,
            output,
            store,
        } => run_compare(&locator1, &locator2, method.into(), output, store),
        Commands::Stats { output, store } => run_stats(output, store),
    };

    if let Err(error) = outcome {
        eprintln!("{} {}", style("error:").red().bold(), error);
        std::process::exit(1);
    }

    Ok(())
}

fn run_compare(
    locator1: &str,
    locator2: &str,
    method: Method,
    output: OutputFormat,
    store: Option<PathBuf>,
) -> Result<()> {
    let comparator = Comparator::builder()
        .store(Box::new(open_store(store)?))
        .build();

    let spinner = match output {
        OutputFormat::Pretty => Some(make_spinner(&format!(
            "Comparing with {} ...",
            method.as_token()
        ))),
        OutputFormat::Json => None,
    };

    let score = comparator.compare(locator1, locator2, method);

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let score = score?;

    match output {
        OutputFormat::Pretty => {
            println!(
                "{} {}",
                style("Similarity:").bold(),
                style(format!("{:.4}", score)).green()
            );
            println!("  method: {}", method.as_token());
            println!("  input1: {}", locator1);
            println!("  input2: {}", locator2);
        }
        OutputFormat::Json => {
            let payload = CompareOutput {
                input1: locator1,
                input2: locator2,
                method,
                similarity_score: score,
            };
            println!("{}", serde_json::to_string_pretty(&payload).map_err(json_error)?);
        }
    }

    Ok(())
}

fn run_stats(output: OutputFormat, store: Option<PathBuf>) -> Result<()> {
    let comparator = Comparator::builder()
        .store(Box::new(open_store(store)?))
        .build();

    let stats = comparator.stats()?;

    match output {
        OutputFormat::Pretty => print_stats_table(&stats),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats).map_err(json_error)?);
        }
    }

    Ok(())
}

fn print_stats_table(stats: &[MethodStats]) {
    if stats.is_empty() {
        println!("No comparisons stored yet.");
        return;
    }

    println!(
        "{:<8} {:>8} {:>8} {:>8} {:>8}",
        style("method").bold(),
        style("count").bold(),
        style("min").bold(),
        style("max").bold(),
        style("mean").bold()
    );
    for row in stats {
        println!(
            "{:<8} {:>8} {:>8.4} {:>8.4} {:>8.4}",
            row.method.as_token(),
            row.count,
            row.min,
            row.max,
            row.mean
        );
    }
}

/// Open the store at the given path, or the default location under the
/// platform cache directory.
fn open_store(path: Option<PathBuf>) -> Result<SqliteStore> {
    let path = match path {
        Some(path) => path,
        None => default_store_path()?,
    };

    Ok(SqliteStore::open(&path)?)
}

fn default_store_path() -> Result<PathBuf> {
    let base = dirs::cache_dir()
        .ok_or_else(|| SimilarityError::Config("no cache directory on this platform".into()))?;
    Ok(base.join("imgsim").join("comparisons.db"))
}

fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn json_error(error: serde_json::Error) -> SimilarityError {
    SimilarityError::Config(format!("failed to serialize output: {}", error))
}
