//! Execution engine: parse lines, route records to partitions, count, reduce.
//!
//! The parallel plan has three phases separated by barriers:
//!
//! 1. **Parse** -- the input is split into contiguous chunks and each chunk is
//!    parsed on a rayon worker. Valid records are routed into one bucket per
//!    key partition; rejected lines go to the chunk's own
//!    [`RejectionCounter`].
//! 2. **Count** -- each partition gathers its buckets from every chunk and is
//!    counted by exactly one [`KeyedCounter`]. Partitions own disjoint keys, so
//!    no counter is ever written by two threads.
//! 3. **Reduce** -- partial counters and rejection counters are merged and the
//!    result is finalized.
//!
//! The sequential plan is the same pipeline with a single chunk and partition,
//! and produces the same counts.
//!
//! A [`StopSignal`] lets a caller end the run early. Workers stop taking new
//! lines once it is raised; everything already ingested is still counted.

use crate::counter::{CounterError, KeyedCounter};
use crate::error::{PipelineError, PipelineResult};
use crate::metrics::RejectionCounter;
use crate::partition::{partition_for, split_vec};
use crate::record::{ActivityRecord, parse_line};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    Parallel {
        threads: Option<usize>,
        partitions: Option<usize>,
    },
}

/// Cooperative early-stop flag shared between a caller and the runner.
///
/// Workers claim input one line at a time with [`try_take`](Self::try_take).
/// Once the flag is raised, by [`stop`](Self::stop) or by an exhausted line
/// budget, every later claim fails.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    budget: Option<Arc<AtomicU64>>,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that raises itself once `lines` lines have been claimed,
    /// whichever workers claimed them.
    #[must_use]
    pub fn after_lines(lines: u64) -> Self {
        Self {
            stopped: Arc::default(),
            budget: Some(Arc::new(AtomicU64::new(lines))),
        }
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Claim one line of input. `false` means the worker must stop.
    pub fn try_take(&self) -> bool {
        if self.is_stopped() {
            return false;
        }
        let Some(budget) = &self.budget else {
            return true;
        };
        let claimed = budget
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if !claimed {
            self.stop();
        }
        claimed
    }
}

/// Result of a run: final counts plus bookkeeping.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// One `(location, count)` per distinct location; order unspecified.
    pub counts: Vec<(String, u64)>,
    pub rejections: RejectionCounter,
    pub lines_read: u64,
    pub valid_records: u64,
    pub partitions: usize,
    /// Some input was never read because of a stop signal or line limit.
    pub stopped_early: bool,
}

impl RunOutcome {
    #[must_use]
    pub fn count_for(&self, location: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(k, _)| k == location)
            .map(|(_, c)| *c)
    }
}

pub struct Runner {
    pub mode: ExecMode,
    pub default_partitions: usize,
    /// Read at most this many lines from the front of the input.
    pub max_lines: Option<usize>,
    /// Log every parsed record at `info`.
    pub inspect_records: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            mode: ExecMode::Parallel {
                threads: None,
                partitions: None,
            },
            default_partitions: 2 * num_cpus::get().max(2),
            max_lines: None,
            inspect_records: false,
        }
    }
}

/// What one parse worker produced.
struct ChunkOutput {
    buckets: Vec<Vec<ActivityRecord>>,
    rejections: RejectionCounter,
    lines_read: u64,
    stopped: bool,
}

impl Runner {
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            mode: ExecMode::Sequential,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn parallel(threads: Option<usize>, partitions: Option<usize>) -> Self {
        Self {
            mode: ExecMode::Parallel {
                threads,
                partitions,
            },
            ..Self::default()
        }
    }

    /// Parse and count `lines`.
    ///
    /// # Errors
    ///
    /// Fails only if the worker pool cannot be built. Malformed lines are
    /// counted, never returned as errors.
    pub fn run(&self, mut lines: Vec<String>, stop: &StopSignal) -> PipelineResult<RunOutcome> {
        let mut truncated = false;
        if let Some(max) = self.max_lines {
            if lines.len() > max {
                lines.truncate(max);
                truncated = true;
            }
        }

        let mut outcome = match self.mode {
            ExecMode::Sequential => self.exec_seq(lines, stop)?,
            ExecMode::Parallel {
                threads,
                partitions,
            } => {
                let parts = partitions
                    .unwrap_or(self.default_partitions)
                    .max(1)
                    .min(lines.len().max(1));
                match threads {
                    Some(t) => {
                        let pool = rayon::ThreadPoolBuilder::new()
                            .num_threads(t)
                            .build()
                            .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;
                        pool.install(|| self.exec_parallel(lines, parts, stop))?
                    }
                    None => self.exec_parallel(lines, parts, stop)?,
                }
            }
        };
        outcome.stopped_early |= truncated;

        info!(
            lines_read = outcome.lines_read,
            valid_records = outcome.valid_records,
            invalid_lines = outcome.rejections.total(),
            locations = outcome.counts.len(),
            stopped_early = outcome.stopped_early,
            "counting finished"
        );
        Ok(outcome)
    }

    fn exec_seq(&self, lines: Vec<String>, stop: &StopSignal) -> PipelineResult<RunOutcome> {
        let chunk = parse_chunk(lines, 1, stop, self.inspect_records);
        reduce(vec![chunk], 1, |parts| {
            parts.into_iter().map(count_partition).collect()
        })
    }

    fn exec_parallel(
        &self,
        lines: Vec<String>,
        partitions: usize,
        stop: &StopSignal,
    ) -> PipelineResult<RunOutcome> {
        let chunks = split_vec(lines, partitions);
        debug!(chunks = chunks.len(), partitions, "parallel plan");

        let inspect = self.inspect_records;
        let parsed: Vec<ChunkOutput> = chunks
            .into_par_iter()
            .map(|chunk| parse_chunk(chunk, partitions, stop, inspect))
            .collect();

        reduce(parsed, partitions, |buckets| {
            buckets.into_par_iter().map(count_partition).collect()
        })
    }
}

/// Parse one chunk, routing records into `partitions` buckets by location.
fn parse_chunk(
    lines: Vec<String>,
    partitions: usize,
    stop: &StopSignal,
    inspect: bool,
) -> ChunkOutput {
    let mut out = ChunkOutput {
        buckets: (0..partitions).map(|_| Vec::new()).collect(),
        rejections: RejectionCounter::new(),
        lines_read: 0,
        stopped: false,
    };
    for line in lines {
        if !stop.try_take() {
            out.stopped = true;
            break;
        }
        out.lines_read += 1;
        match parse_line(&line) {
            Ok(record) => {
                if inspect {
                    info!("{record}");
                }
                let p = partition_for(record.location(), partitions);
                out.buckets[p].push(record);
            }
            Err(reason) => {
                debug!(%reason, line = %line, "rejected line");
                out.rejections.record(reason);
            }
        }
    }
    out
}

/// Count every record routed to one partition with a single writer.
fn count_partition(buckets: Vec<Vec<ActivityRecord>>) -> Result<KeyedCounter, CounterError> {
    let mut counter = KeyedCounter::new();
    for record in buckets.iter().flatten() {
        counter.ingest(record)?;
    }
    Ok(counter)
}

/// Transpose chunk buckets into partitions, count them, and merge the results.
fn reduce<F>(chunks: Vec<ChunkOutput>, partitions: usize, count: F) -> PipelineResult<RunOutcome>
where
    F: FnOnce(Vec<Vec<Vec<ActivityRecord>>>) -> Result<Vec<KeyedCounter>, CounterError>,
{
    let mut rejections = RejectionCounter::new();
    let mut lines_read = 0u64;
    let mut stopped_early = false;
    let mut per_partition: Vec<Vec<Vec<ActivityRecord>>> =
        (0..partitions).map(|_| Vec::new()).collect();

    for chunk in chunks {
        rejections.merge(&chunk.rejections);
        lines_read += chunk.lines_read;
        stopped_early |= chunk.stopped;
        for (i, bucket) in chunk.buckets.into_iter().enumerate() {
            per_partition[i].push(bucket);
        }
    }

    let mut total = KeyedCounter::new();
    for partial in count(per_partition)? {
        total.merge(partial)?;
    }
    let valid_records = total.total();

    Ok(RunOutcome {
        counts: total.finalize(),
        rejections,
        lines_read,
        valid_records,
        partitions,
        stopped_early,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn stop_before_run_reads_nothing() {
        let stop = StopSignal::new();
        stop.stop();
        let out = Runner::sequential()
            .run(lines(&["0, AN, 1, 1, P"]), &stop)
            .unwrap();
        assert_eq!(out.lines_read, 0);
        assert!(out.counts.is_empty());
        assert!(out.stopped_early);
    }

    #[test]
    fn parallel_clamps_partitions_to_input() {
        let out = Runner::parallel(Some(2), Some(64))
            .run(lines(&["0, AN, 1, 1, P", "1, AK, 1, 1, P"]), &StopSignal::new())
            .unwrap();
        assert_eq!(out.partitions, 2);
        assert_eq!(out.valid_records, 2);
    }

    #[test]
    fn line_budget_is_claimed_exactly_once() {
        let stop = StopSignal::after_lines(2);
        let clone = stop.clone();
        assert!(stop.try_take());
        assert!(clone.try_take());
        assert!(!stop.is_stopped());
        assert!(!stop.try_take());
        assert!(clone.is_stopped());
        assert!(!clone.try_take());
    }

    #[test]
    fn plain_signal_never_runs_out() {
        let stop = StopSignal::new();
        assert!((0..1000).all(|_| stop.try_take()));
        stop.stop();
        assert!(!stop.try_take());
    }

    #[test]
    fn partition_counter_flattens_buckets() {
        let record = parse_line("0, AN, 1, 1, P").unwrap();
        let counter = count_partition(vec![vec![record.clone()], vec![record]]).unwrap();
        assert_eq!(counter.get("AN"), Some(2));
    }

    #[test]
    fn reduce_surfaces_counter_errors() {
        let chunk = parse_chunk(lines(&["0, AN, 1, 1, P"]), 1, &StopSignal::new(), false);
        let err = reduce(vec![chunk], 1, |_| Err(CounterError::Finalized)).unwrap_err();
        assert!(matches!(err, PipelineError::Counter(CounterError::Finalized)));
    }
}
