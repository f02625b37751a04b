//! Rejection counting and run metrics.
//!
//! Malformed lines are not errors: they are absorbed into a
//! [`RejectionCounter`] owned by the run. Each runner worker keeps its own
//! counter and the runner sums them in its reduction step, so no counter is
//! ever shared between threads.
//!
//! After a run, [`RunMetrics`] summarizes what happened and can be logged,
//! exported as JSON, or saved to a file.
//!
//! # Example
//!
//! ```
//! use truckbeam::metrics::RejectionCounter;
//! use truckbeam::record::RejectReason;
//!
//! let mut a = RejectionCounter::new();
//! a.record(RejectReason::BadFlag);
//! let mut b = RejectionCounter::new();
//! b.record(RejectReason::WrongFieldCount(1));
//! a.merge(&b);
//! assert_eq!(a.total(), 2);
//! assert_eq!(a.count_for(RejectReason::BadFlag), 1);
//! ```

use crate::error::{PipelineError, PipelineResult};
use crate::record::RejectReason;
use serde_json::{Value, json};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Name of the rejected-lines counter, matching the job's historical aggregator.
pub const INVALID_LINES: &str = "invalidLogLines";
pub const VALID_RECORDS: &str = "validRecords";
pub const LINES_READ: &str = "linesRead";

/// Monotonic count of lines that failed to parse, broken down by cause.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RejectionCounter {
    by_cause: [u64; 4],
}

fn cause_index(reason: RejectReason) -> usize {
    match reason {
        RejectReason::WrongFieldCount(_) => 0,
        RejectReason::BadFlag => 1,
        RejectReason::BadTimestamp => 2,
        RejectReason::BadTruckId => 3,
    }
}

impl RejectionCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: RejectReason) {
        self.by_cause[cause_index(reason)] += 1;
    }

    /// Fold another worker's counts into this one.
    pub fn merge(&mut self, other: &RejectionCounter) {
        for (mine, theirs) in self.by_cause.iter_mut().zip(other.by_cause.iter()) {
            *mine += theirs;
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.by_cause.iter().sum()
    }

    #[must_use]
    pub fn count_for(&self, reason: RejectReason) -> u64 {
        self.by_cause[cause_index(reason)]
    }

    /// `(label, count)` per cause, in [`RejectReason::ALL`] order.
    #[must_use]
    pub fn by_reason(&self) -> Vec<(&'static str, u64)> {
        RejectReason::ALL
            .iter()
            .map(|r| (r.label(), self.count_for(*r)))
            .collect()
    }
}

/// Summary of one pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunMetrics {
    pub lines_read: u64,
    pub valid_records: u64,
    pub rejections: RejectionCounter,
    pub distinct_locations: usize,
    pub partitions: usize,
    pub stopped_early: bool,
    pub elapsed: Duration,
}

impl RunMetrics {
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejections.total()
    }

    /// All metrics as a JSON object keyed by metric name.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut metrics = serde_json::Map::new();
        metrics.insert(LINES_READ.to_string(), json!(self.lines_read));
        metrics.insert(VALID_RECORDS.to_string(), json!(self.valid_records));
        metrics.insert(INVALID_LINES.to_string(), json!(self.rejected()));
        for (label, count) in self.rejections.by_reason() {
            metrics.insert(format!("{INVALID_LINES}.{label}"), json!(count));
        }
        metrics.insert(
            "distinctLocations".to_string(),
            json!(self.distinct_locations),
        );
        metrics.insert("partitions".to_string(), json!(self.partitions));
        metrics.insert("stoppedEarly".to_string(), json!(self.stopped_early));
        metrics.insert(
            "execution_time_ms".to_string(),
            json!(self.elapsed.as_millis() as u64),
        );
        Value::Object(metrics)
    }

    /// Save all metrics to a pretty-printed JSON file.
    ///
    /// # Errors
    ///
    /// [`PipelineError::SinkWriteFailure`] if the file cannot be created or
    /// written to.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let path = path.as_ref();
        let fail = |e: std::io::Error| PipelineError::sink_write_failure(path, e);
        let formatted =
            serde_json::to_string_pretty(&self.to_json()).map_err(|e| fail(e.into()))?;
        let mut file = File::create(path).map_err(fail)?;
        file.write_all(formatted.as_bytes()).map_err(fail)?;
        Ok(())
    }

    /// Emit one structured event describing the run.
    pub fn log_summary(&self) {
        info!(
            lines_read = self.lines_read,
            valid_records = self.valid_records,
            invalid_lines = self.rejected(),
            wrong_field_count = self.rejections.count_for(RejectReason::WrongFieldCount(0)),
            bad_flag = self.rejections.count_for(RejectReason::BadFlag),
            bad_timestamp = self.rejections.count_for(RejectReason::BadTimestamp),
            bad_truck_id = self.rejections.count_for(RejectReason::BadTruckId),
            distinct_locations = self.distinct_locations,
            partitions = self.partitions,
            stopped_early = self.stopped_early,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "run_complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_reason_lists_every_cause() {
        let mut c = RejectionCounter::new();
        c.record(RejectReason::BadTruckId);
        c.record(RejectReason::BadTruckId);
        assert_eq!(
            c.by_reason(),
            vec![
                ("wrong_field_count", 0),
                ("bad_flag", 0),
                ("bad_timestamp", 0),
                ("bad_truck_id", 2),
            ]
        );
    }

    #[test]
    fn json_uses_metric_names() {
        let mut rejections = RejectionCounter::new();
        rejections.record(RejectReason::WrongFieldCount(1));
        let m = RunMetrics {
            lines_read: 4,
            valid_records: 3,
            rejections,
            distinct_locations: 2,
            partitions: 1,
            stopped_early: false,
            elapsed: Duration::from_millis(5),
        };
        let v = m.to_json();
        assert_eq!(v[INVALID_LINES], json!(1));
        assert_eq!(v["invalidLogLines.wrong_field_count"], json!(1));
        assert_eq!(v[VALID_RECORDS], json!(3));
        assert_eq!(v["execution_time_ms"], json!(5));
    }
}
