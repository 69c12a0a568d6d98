//! ImageResizer CLI - scale a directory of images concurrently
//!
//! Empties the output directory, resizes every PNG/JPEG found under the
//! input directory into it as JPEG, and reports how long the run took.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};

use image_resizer::parallel::{ProgressTracker, ProgressUpdate};
use image_resizer::{
    init_with_config, CancellationSignal, Config, FilterType, JpegCodec, ResizeOrchestrator,
    RunResult, ScaleFactor, Workspace,
};

/// ImageResizer - concurrent batch image scaler
#[derive(Parser)]
#[command(
    name = "image-resizer",
    version,
    about = "Scale every image in a directory by a fixed factor, one task per file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Source directory (default: ./images)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output directory, emptied before the run (default: ./output)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Scale factor applied to width and height (default: 2.0)
    #[arg(short, long, value_name = "FACTOR")]
    scale: Option<f64>,

    /// JPEG quality (1-100)
    #[arg(short, long, value_name = "QUALITY")]
    quality: Option<u8>,

    /// Resampling filter
    #[arg(short, long, value_enum, value_name = "FILTER")]
    filter: Option<CliFilter>,

    /// Maximum number of images processed at once (default: all)
    #[arg(short, long, value_name = "COUNT")]
    threads: Option<usize>,

    /// Configuration file path (.toml or .yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run with a cancellation signal
    #[arg(long)]
    cancellable: bool,

    /// Basename that cancels the run when encountered (implies --cancellable)
    #[arg(long, value_name = "NAME")]
    cancel_on: Option<String>,

    /// Print the run result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Generate example configuration file
    ExampleConfig {
        /// Output file path
        #[arg(short, long, default_value = "image-resizer.toml")]
        output: PathBuf,
    },
}

/// CLI-compatible filter enum
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFilter {
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<CliFilter> for FilterType {
    fn from(filter: CliFilter) -> Self {
        match filter {
            CliFilter::Triangle => FilterType::Triangle,
            CliFilter::CatmullRom => FilterType::CatmullRom,
            CliFilter::Gaussian => FilterType::Gaussian,
            CliFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Commands::ExampleConfig { output }) = &cli.command {
        match Config::default().to_file(output) {
            Ok(()) => println!(
                "{}: Generated example configuration: {}",
                style("Success").green().bold(),
                output.display()
            ),
            Err(e) => {
                eprintln!("{}: {}", style("Error").red().bold(), e);
                process::exit(1);
            }
        }
        return;
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", style("Error").red().bold(), e);
            process::exit(1);
        }
    };

    if let Err(e) = init_with_config(&config) {
        eprintln!("{}: Failed to initialize: {}", style("Error").red().bold(), e);
        process::exit(1);
    }

    let source = config.processing.source.clone();
    let destination = config.processing.destination.clone();

    if let Err(e) = Workspace::clean(&destination) {
        error!("Could not prepare output directory: {}", e);
        eprintln!("{}: {}", style("Error").red().bold(), e.user_message());
        process::exit(1);
    }

    let tracker = Arc::new(ProgressTracker::new());
    let progress = if cli.json || cli.quiet {
        None
    } else {
        Some(spawn_progress_bar(&tracker))
    };
    let orchestrator = build_orchestrator(&config, tracker);

    info!("Input: {:?}", source);
    info!("Output: {:?}", destination);

    let scale = ScaleFactor::new(config.resize.scale);
    let start_time = Instant::now();
    let result = if config.processing.cancellable {
        let signal = CancellationSignal::new();
        orchestrator
            .resize_all_cancellable(&source, &destination, scale, &signal)
            .await
    } else {
        orchestrator.resize_all(&source, &destination, scale).await
    };
    let elapsed = start_time.elapsed();

    if let Some(handle) = progress {
        let _ = handle.await;
    }

    match result {
        Ok(outcome) => print_outcome(&outcome, elapsed, cli.json),
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("{}: Processing failed: {}", style("Error").red().bold(), e.user_message());
            if let Some(file) = e.file_path() {
                eprintln!("  File: {}", file.display());
            }
            process::exit(1);
        }
    }
}

/// Merge the optional config file with CLI overrides
fn build_config(cli: &Cli) -> image_resizer::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(input) = &cli.input {
        config.processing.source = input.clone();
    }
    if let Some(output) = &cli.output {
        config.processing.destination = output.clone();
    }
    if let Some(scale) = cli.scale {
        config.resize.scale = scale;
    }
    if let Some(quality) = cli.quality {
        config.resize.quality = quality;
    }
    if let Some(filter) = cli.filter {
        config.resize.filter = filter.into();
    }
    if cli.threads.is_some() {
        config.processing.max_concurrent = cli.threads;
    }
    if cli.cancellable {
        config.processing.cancellable = true;
    }
    if let Some(name) = &cli.cancel_on {
        config.processing.cancellable = true;
        config.processing.cancel_on = Some(name.clone());
    }

    if cli.quiet {
        config.logging.level = "error".to_string();
    } else if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

fn build_orchestrator(config: &Config, tracker: Arc<ProgressTracker>) -> ResizeOrchestrator {
    let codec = JpegCodec::new()
        .filter(config.resize.filter)
        .quality(config.resize.quality);

    let mut orchestrator = ResizeOrchestrator::new()
        .with_codec(Arc::new(codec))
        .with_max_concurrent(config.processing.max_concurrent)
        .with_progress(tracker);

    if let Some(name) = &config.processing.cancel_on {
        orchestrator = orchestrator.with_sentinel(name.clone());
    }

    orchestrator
}

/// Drive a progress bar from the run's progress events
fn spawn_progress_bar(tracker: &ProgressTracker) -> tokio::task::JoinHandle<()> {
    let mut receiver = tracker.subscribe();

    tokio::spawn(async move {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        loop {
            match receiver.recv().await {
                Ok(ProgressUpdate::Started { total_files }) => pb.set_length(total_files as u64),
                Ok(ProgressUpdate::UnitStarted { filename }) => pb.set_message(filename),
                Ok(ProgressUpdate::UnitFinished { .. }) => pb.inc(1),
                Ok(ProgressUpdate::RunFinished { snapshot }) => {
                    debug!("Progress: {}", snapshot.status_text());
                    break;
                }
                Err(RecvError::Lagged(skipped)) => debug!("Progress bar skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }

        pb.finish_and_clear();
    })
}

fn print_outcome(outcome: &RunResult, elapsed: std::time::Duration, json_output: bool) {
    if json_output {
        match serde_json::to_string_pretty(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize result: {}", e),
        }
        return;
    }

    let summary = outcome.summary();

    println!();
    match outcome {
        RunResult::Completed(_) => println!("{}", style("Finished all files").green().bold()),
        RunResult::Cancelled(_) => println!("{}", style("Executor had been canceled").yellow().bold()),
    }
    println!("  {}: {}", style("Discovered").cyan(), summary.discovered);
    println!("  {}: {}", style("Written").green(), summary.written);
    if summary.cancelled > 0 {
        println!("  {}: {}", style("Skipped").yellow(), summary.cancelled);
    }
    if summary.failed > 0 {
        println!("  {}: {}", style("Failed").red(), summary.failed);
    }
    println!("  {}: {} ms", style("Elapsed").blue(), elapsed.as_millis());
}
