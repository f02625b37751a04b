//! Command-line entry point for the package count pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use truckbeam::{Pipeline, PipelineOptions, RunMode};

/// Count package pickup/drop-off events per location
#[derive(Parser, Debug)]
#[command(name = "truckbeam", version, about)]
struct Args {
    /// Path to a TOML options file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local runs the built-in sample log; remote reads files under the base path
    #[arg(long, value_enum)]
    mode: Option<RunMode>,

    /// Root for input and output paths
    #[arg(long)]
    base_path: Option<PathBuf>,

    /// Input glob, relative to the base path
    #[arg(long)]
    input: Option<String>,

    /// Output file, relative to the base path
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    partitions: Option<usize>,

    /// Run on the calling thread with a single partition
    #[arg(long)]
    sequential: bool,

    /// Stop after this many input lines
    #[arg(long)]
    max_lines: Option<usize>,

    /// Write run metrics as JSON to this file
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

impl Args {
    fn into_options(self) -> Result<PipelineOptions> {
        let mut opts = match &self.config {
            Some(path) => PipelineOptions::from_file(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => PipelineOptions::default(),
        };
        if let Some(mode) = self.mode {
            opts.mode = mode;
        }
        if self.base_path.is_some() {
            opts.base_path = self.base_path;
        }
        if let Some(input) = self.input {
            opts.input_pattern = input;
        }
        if let Some(output) = self.output {
            opts.output_path = output;
        }
        opts.threads = self.threads.or(opts.threads);
        opts.partitions = self.partitions.or(opts.partitions);
        opts.sequential |= self.sequential;
        opts.max_lines = self.max_lines.or(opts.max_lines);
        opts.metrics_path = self.metrics_out.or(opts.metrics_path);
        Ok(opts)
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let opts = args.into_options()?;
    info!(
        mode = ?opts.mode,
        base_path = ?opts.base_path,
        input = %opts.resolved_input_pattern(),
        output = %opts.resolved_output_path().display(),
        threads = ?opts.threads,
        partitions = ?opts.partitions,
        sequential = opts.sequential,
        "config_loaded"
    );

    let report = Pipeline::from_options(&opts)?.run()?;
    info!(
        locations = report.output_lines.len(),
        invalid_lines = report.metrics.rejected(),
        "done"
    );
    Ok(())
}
