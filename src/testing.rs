//! Helpers for testing count pipelines.
//!
//! Count output has no defined order, so these assertions compare results
//! after sorting by location.
//!
//! ```
//! use truckbeam::testing::{assert_counts_eq, log_line};
//! use truckbeam::runner::{Runner, StopSignal};
//!
//! let lines = vec![log_line(false, "AN", 1, 423, "P1"), log_line(true, "AK", 2, 0, "P2")];
//! let out = Runner::sequential().run(lines, &StopSignal::new()).unwrap();
//! assert_counts_eq(&out.counts, &[("AK", 1), ("AN", 1)]);
//! ```

use std::fmt::Debug;

/// Assert that `(location, count)` pairs match `expected`, ignoring order.
///
/// # Panics
///
/// Panics with both sorted collections if they differ.
pub fn assert_counts_eq(actual: &[(String, u64)], expected: &[(&str, u64)]) {
    let mut actual: Vec<(&str, u64)> = actual.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let mut expected = expected.to_vec();
    actual.sort_unstable();
    expected.sort_unstable();
    assert_eq!(
        actual, expected,
        "Count mismatch after sorting by location:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}

/// Assert that two collections contain the same elements, ignoring order.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
pub fn assert_unordered_eq<T: Debug + Ord + Clone>(actual: &[T], expected: &[T]) {
    let mut a = actual.to_vec();
    let mut e = expected.to_vec();
    a.sort();
    e.sort();
    assert_eq!(
        a.len(),
        e.len(),
        "Collection length mismatch:\n  Expected: {e:?}\n  Actual: {a:?}"
    );
    assert_eq!(a, e, "Collection content mismatch (order ignored)");
}

/// Render a well-formed log line.
#[must_use]
pub fn log_line(
    is_arrival: bool,
    location: &str,
    epoch_seconds: i64,
    truck_id: i32,
    package_id: &str,
) -> String {
    format!(
        "{}, {location}, {epoch_seconds}, {truck_id}, {package_id}",
        u8::from(is_arrival)
    )
}

/// `n` well-formed lines cycling through `locations`, so location `i` gets
/// `n / locations.len()` lines plus one if `i < n % locations.len()`.
#[must_use]
pub fn cycled_lines(locations: &[&str], n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let loc = locations[i % locations.len()];
            log_line(
                i % 2 == 1,
                loc,
                1_467_394_122 + i as i64,
                (i % 500) as i32,
                &format!("PKG{i}"),
            )
        })
        .collect()
}
