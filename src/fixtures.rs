//! Built-in sample data for local runs and tests.

/// A short package activity log with a few malformed lines mixed in.
///
/// Parsing it yields 11 records and 3 rejections; counting by location gives
/// `AN: 3`, `AK: 4`, `BK: 4`.
pub const MINI_LOG: [&str; 14] = [
    "0, AN, 1467394122, 423, 372A3SZ4J98",
    "0, AN, 1467394122, 423##############",
    "1, AK, 1467394123, 102, 320893JSEFE",
    "404 - broken message",
    "1, AN, 1467394123, 423, 372A3SZ4J98",
    "1, AK, 1467394120, 102, 320893JSEFE",
    "1, BK, 1467494150, 190, 3JISE23423J",
    "0, AK, 1467494123, 12, 320893JSEFE",
    "404 - broken message",
    "0, AN, 1467395123, 42, 372A3SZ4J98",
    "0, AK, 1467394150, 12, 320893JSEFE",
    "0, BK, 1467495150, 19, 3JISE23423J",
    "1, BK, 1467495150, 19, 3JISE234",
    "1, BK, 1467495150, 19, 34HWINF",
];

/// [`MINI_LOG`] as owned lines.
#[must_use]
pub fn mini_log() -> Vec<String> {
    MINI_LOG.iter().map(|s| (*s).to_string()).collect()
}
