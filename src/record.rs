//! Parsing of package activity log lines.
//!
//! Each log line describes one pickup or drop-off of a package at a facility
//! and carries exactly five comma-separated fields:
//!
//! ```text
//! isArrivalFlag, location, epochSeconds, truckId, packageId
//! 0,             AN,       1467394122,   423,     372A3SZ4J98
//! ```
//!
//! [`parse_line`] is total: it returns either a fully populated
//! [`ActivityRecord`] or a [`RejectReason`]. It touches no shared state, so
//! runner workers call it concurrently without coordination.
//!
//! # Example
//!
//! ```
//! use truckbeam::record::{parse_line, RejectReason};
//!
//! let rec = parse_line("1, AK, 1467394123, 102, 320893JSEFE").unwrap();
//! assert!(rec.is_arrival());
//! assert_eq!(rec.location(), "AK");
//! assert_eq!(rec.timestamp_ms(), 1_467_394_123_000);
//!
//! assert_eq!(parse_line("404 - broken message"), Err(RejectReason::WrongFieldCount(1)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use thiserror::Error;

/// Milliseconds since UNIX epoch (UTC).
pub type TimestampMs = i64;

/// Number of fields in a well-formed log line.
pub const FIELD_COUNT: usize = 5;

/// Reserved location code for the customer counter.
pub const CUSTOMER_COUNTER: &str = "CU";

/// Truck id used when a customer drops off or picks up in person.
pub const NO_TRUCK: i32 = 0;

/// One observed pickup or drop-off event.
///
/// Records are immutable once parsed; all fields are exposed through accessors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityRecord {
    is_arrival: bool,
    location: String,
    timestamp_ms: TimestampMs,
    truck_id: i32,
    package_id: String,
}

impl ActivityRecord {
    pub fn new(
        is_arrival: bool,
        location: impl Into<String>,
        timestamp_ms: TimestampMs,
        truck_id: i32,
        package_id: impl Into<String>,
    ) -> Self {
        Self {
            is_arrival,
            location: location.into(),
            timestamp_ms,
            truck_id,
            package_id: package_id.into(),
        }
    }

    /// `true` for an arrival, `false` for a departure.
    pub fn is_arrival(&self) -> bool {
        self.is_arrival
    }

    /// Facility code, or [`CUSTOMER_COUNTER`].
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn timestamp_ms(&self) -> TimestampMs {
        self.timestamp_ms
    }

    /// `0` ([`NO_TRUCK`]) means the package was handled by a customer.
    pub fn truck_id(&self) -> i32 {
        self.truck_id
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn is_customer(&self) -> bool {
        self.truck_id == NO_TRUCK
    }
}

impl Display for ActivityRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(
            f,
            "PackageActivityInfo [isArrival={}, location={}, packageId={}]",
            self.is_arrival, self.location, self.package_id
        )
    }
}

/// Why a line was rejected.
///
/// Rejection never changes the accept/reject outcome; the cause only feeds
/// per-cause counters and debug logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("expected 5 fields, found {0}")]
    WrongFieldCount(usize),
    #[error("arrival flag is not 0 or 1")]
    BadFlag,
    #[error("timestamp is not an integer number of epoch seconds")]
    BadTimestamp,
    #[error("truck id is not an integer")]
    BadTruckId,
}

impl RejectReason {
    /// All causes, in a fixed order used for reporting.
    pub const ALL: [RejectReason; 4] = [
        RejectReason::WrongFieldCount(0),
        RejectReason::BadFlag,
        RejectReason::BadTimestamp,
        RejectReason::BadTruckId,
    ];

    /// Stable metric label for this cause.
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::WrongFieldCount(_) => "wrong_field_count",
            RejectReason::BadFlag => "bad_flag",
            RejectReason::BadTimestamp => "bad_timestamp",
            RejectReason::BadTruckId => "bad_truck_id",
        }
    }
}

/// Split on `,`, dropping trailing empty segments the way log producers'
/// `split(",")` did, so `"a,b,c,d,"` has four fields rather than five and
/// `",,,,"` has none. An empty line is a single empty field.
fn split_fields(line: &str) -> Vec<&str> {
    if line.is_empty() {
        return vec![line];
    }
    let mut fields: Vec<&str> = line.split(',').collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Parse one log line into an [`ActivityRecord`].
///
/// Every field is trimmed before it is interpreted. `location` and
/// `packageId` are taken verbatim; negative truck ids and empty package ids
/// are accepted.
///
/// # Errors
///
/// Returns the first [`RejectReason`] encountered; there is no partial record.
pub fn parse_line(line: &str) -> Result<ActivityRecord, RejectReason> {
    let fields = split_fields(line);
    if fields.len() != FIELD_COUNT {
        return Err(RejectReason::WrongFieldCount(fields.len()));
    }

    let is_arrival = match fields[0].trim().parse::<i32>() {
        Ok(0) => false,
        Ok(1) => true,
        _ => return Err(RejectReason::BadFlag),
    };
    let location = fields[1].trim();
    let timestamp_ms = fields[2]
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| secs.checked_mul(1000))
        .ok_or(RejectReason::BadTimestamp)?;
    let truck_id = fields[3]
        .trim()
        .parse::<i32>()
        .map_err(|_| RejectReason::BadTruckId)?;
    let package_id = fields[4].trim();

    Ok(ActivityRecord::new(
        is_arrival,
        location,
        timestamp_ms,
        truck_id,
        package_id,
    ))
}
