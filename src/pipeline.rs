//! The package-count pipeline as an explicit chain of stages.
//!
//! ```text
//! read_source ─► Runner::run (parse ─► route ─► count ─► reduce) ─► format_counts ─► write_sink
//! ```
//!
//! Each stage is a plain function; [`Pipeline::run`] wires them together and
//! reports the outcome with [`RunMetrics`].

use crate::config::{PipelineOptions, RunMode};
use crate::counter::format_count;
use crate::error::PipelineResult;
use crate::fixtures::mini_log;
use crate::io::text::{read_lines_from_pattern, write_lines};
use crate::metrics::RunMetrics;
use crate::runner::{RunOutcome, Runner, StopSignal};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Where input lines come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// In-memory lines.
    Fixture(Vec<String>),
    /// Every file matching a glob pattern.
    Files { pattern: String },
}

impl Source {
    fn describe(&self) -> String {
        match self {
            Source::Fixture(lines) => format!("fixture({} lines)", lines.len()),
            Source::Files { pattern } => pattern.clone(),
        }
    }
}

/// Where formatted counts go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sink {
    /// One `info` event per output line.
    Log,
    File(PathBuf),
}

/// Everything a finished run produced.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Lines handed to the sink, `"<location>: <count>"`.
    pub output_lines: Vec<String>,
    pub metrics: RunMetrics,
}

pub struct Pipeline {
    source: Source,
    sink: Sink,
    runner: Runner,
    metrics_path: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(source: Source, sink: Sink, runner: Runner) -> Self {
        Self {
            source,
            sink,
            runner,
            metrics_path: None,
        }
    }

    /// Build the pipeline `options` describe: the sample log and a log sink
    /// in local mode, matched files and an output file in remote mode.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`](crate::PipelineError::Config) if the options
    /// do not validate.
    pub fn from_options(options: &PipelineOptions) -> PipelineResult<Self> {
        options.validate()?;
        let (source, sink) = match options.mode {
            RunMode::Local => (Source::Fixture(mini_log()), Sink::Log),
            RunMode::Remote => (
                Source::Files {
                    pattern: options.resolved_input_pattern(),
                },
                Sink::File(options.resolved_output_path()),
            ),
        };
        let mut pipeline = Self::new(source, sink, options.runner());
        pipeline.metrics_path = options.metrics_path.clone();
        Ok(pipeline)
    }

    /// Also save run metrics as JSON to `path`.
    #[must_use]
    pub fn with_metrics_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Run to completion.
    ///
    /// # Errors
    ///
    /// Source, sink, and worker-pool failures. Malformed lines are counted in
    /// the report instead.
    pub fn run(&self) -> PipelineResult<RunReport> {
        self.run_with_stop(&StopSignal::new())
    }

    /// Run, stopping early once `stop` is raised. Output still contains
    /// correct counts for every line read before the stop.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_with_stop(&self, stop: &StopSignal) -> PipelineResult<RunReport> {
        let start = Instant::now();
        info!(source = %self.source.describe(), sink = ?self.sink, "pipeline starting");

        let lines = read_source(&self.source)?;
        let outcome = self.runner.run(lines, stop)?;
        let output_lines = format_counts(&outcome.counts);
        write_sink(&self.sink, &output_lines)?;

        let metrics = RunMetrics {
            lines_read: outcome.lines_read,
            valid_records: outcome.valid_records,
            rejections: outcome.rejections,
            distinct_locations: outcome.counts.len(),
            partitions: outcome.partitions,
            stopped_early: outcome.stopped_early,
            elapsed: start.elapsed(),
        };
        metrics.log_summary();
        if let Some(path) = &self.metrics_path {
            metrics.save_to_file(path)?;
        }

        Ok(RunReport {
            outcome,
            output_lines,
            metrics,
        })
    }
}

/// Materialize the input lines of `source`.
///
/// # Errors
///
/// Source errors for [`Source::Files`]; fixtures never fail.
pub fn read_source(source: &Source) -> PipelineResult<Vec<String>> {
    match source {
        Source::Fixture(lines) => Ok(lines.clone()),
        Source::Files { pattern } => read_lines_from_pattern(pattern),
    }
}

/// One output line per `(location, count)`.
#[must_use]
pub fn format_counts(counts: &[(String, u64)]) -> Vec<String> {
    counts
        .iter()
        .map(|(location, count)| format_count(location, *count))
        .collect()
}

/// Deliver output lines to `sink`.
///
/// # Errors
///
/// [`PipelineError::SinkWriteFailure`](crate::PipelineError::SinkWriteFailure)
/// for file sinks.
pub fn write_sink(sink: &Sink, lines: &[String]) -> PipelineResult<()> {
    match sink {
        Sink::Log => {
            for line in lines {
                info!(target: "truckbeam::output", "{line}");
            }
        }
        Sink::File(path) => {
            let n = write_lines(path, lines)?;
            info!(path = %path.display(), lines = n, "wrote counts");
        }
    }
    Ok(())
}
