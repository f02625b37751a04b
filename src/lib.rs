//! # Truckbeam
//!
//! A batch pipeline that reads package pickup/drop-off logs, parses each line
//! into an [`ActivityRecord`], counts malformed lines, and reports how many
//! events each location saw.
//!
//! ## Quick Start
//!
//! ```
//! use truckbeam::*;
//!
//! # fn main() -> Result<(), PipelineError> {
//! let lines = vec![
//!     "0, AN, 1467394122, 423, 372A3SZ4J98".to_string(),
//!     "0, AN, 1467394122, 423##############".to_string(),
//!     "1, AK, 1467394123, 102, 320893JSEFE".to_string(),
//!     "404 - broken message".to_string(),
//! ];
//!
//! let out = Runner::default().run(lines, &StopSignal::new())?;
//! assert_eq!(out.rejections.total(), 2);
//! assert_eq!(out.count_for("AN"), Some(1));
//! assert_eq!(out.count_for("AK"), Some(1));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Parsing
//!
//! [`parse_line`] turns one line of text into an [`ActivityRecord`] or a
//! [`RejectReason`]. It is pure and safe to call from any thread.
//!
//! ### Counting
//!
//! A [`KeyedCounter`] accumulates counts per location and is finalized once
//! input ends. Finalizing twice returns the same result.
//!
//! ### Execution
//!
//! The [`Runner`] parses chunks of input in parallel, routes records to
//! partitions by a hash of their location, counts each partition with a
//! single writer, and sums the partial results. A [`StopSignal`] ends a run
//! early with correct partial counts.
//!
//! ### Pipelines
//!
//! A [`Pipeline`] wires a [`Source`] (the built-in sample log or files matched
//! by a glob) to a [`Sink`] (log output or a text file) through the runner.
//! [`PipelineOptions`] selects them from a [`RunMode`].
//!
//! ## Module Overview
//!
//! - [`record`] - log line parsing
//! - [`counter`] - per-location counting
//! - [`partition`] - key routing
//! - [`runner`] - sequential and parallel execution
//! - [`metrics`] - rejection counters and run metrics
//! - [`io`] - globbing, compressed input, text output
//! - [`config`] - options and TOML loading
//! - [`pipeline`] - stage composition
//! - [`fixtures`] - built-in sample log
//! - [`testing`] - assertions for tests

pub mod config;
pub mod counter;
pub mod error;
pub mod fixtures;
pub mod io;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod testing;

pub use config::{PipelineOptions, RunMode};
pub use counter::{CombineFn, Count, CounterError, CounterState, KeyedCounter, format_count};
pub use error::{PipelineError, PipelineResult};
pub use metrics::{RejectionCounter, RunMetrics};
pub use pipeline::{Pipeline, RunReport, Sink, Source};
pub use record::{ActivityRecord, RejectReason, TimestampMs, parse_line};
pub use runner::{ExecMode, RunOutcome, Runner, StopSignal};
