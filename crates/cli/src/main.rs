//! s2ndvi CLI - NDVI Cloud Optimized GeoTIFFs from Sentinel-2 products

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use s2ndvi_product::{run, NdviConfig, PipelineError, ProductName, RunSummary, DEFAULT_BASENAME};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "s2ndvi")]
#[command(
    author,
    version,
    about = "Compute NDVI from the 10 m red (B04) and NIR (B08) bands of a Sentinel-2 product",
    long_about = None,
    after_help = "Sentinel-2 SAFE bands are JPEG 2000 (.jp2) files and need a build with \
                  `--features gdal`. The default build reads GeoTIFF (.tif) bands only."
)]
struct Cli {
    /// Sentinel-2 product directory (SAFE layout)
    input_product_directory: PathBuf,

    /// Directory for the output GeoTIFF, created if missing
    output_directory: PathBuf,

    /// Output file stem [default: s2-2a-10m-ndvi]
    output_basename: Option<String>,

    /// Derive the output stem from the product name when none is given,
    /// e.g. 32TQM_20230615T101559_ndvi
    #[arg(long)]
    derive_name: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Explicit stem, then derived stem, then the default
    fn basename(&self) -> Result<String> {
        if let Some(name) = &self.output_basename {
            return Ok(name.clone());
        }
        if self.derive_name {
            let product = ProductName::from_dir(&self.input_product_directory).with_context(|| {
                format!(
                    "cannot derive an output name from {}",
                    self.input_product_directory.display()
                )
            })?;
            debug!(product = %product, "parsed product name");
            return Ok(product.output_basename());
        }
        Ok(DEFAULT_BASENAME.to_string())
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn done(summary: &RunSummary, elapsed: std::time::Duration) {
    println!("NDVI saved to: {}", summary.output.display());
    println!("  Size: {} x {}", summary.cols, summary.rows);
    println!("  Processing time: {:.2?}", elapsed);
}

fn execute(cli: &Cli, basename: String) -> Result<RunSummary, PipelineError> {
    let config = NdviConfig::new(&cli.input_product_directory, &cli.output_directory)
        .with_basename(basename);

    let pb = spinner("Computing NDVI...");
    let result = run(&config);
    pb.finish_and_clear();
    result
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("warning: {:#}", e);
    }

    let basename = match cli.basename() {
        Ok(name) => name,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    match execute(&cli, basename) {
        Ok(summary) => {
            info!(red = %summary.red.display(), nir = %summary.nir.display(), "bands used");
            done(&summary, start.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}: {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}
