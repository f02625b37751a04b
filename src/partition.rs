//! Routing of keys to single-writer partitions.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Index of the partition that owns `key`, in `0..partitions`.
///
/// The hash is deterministic across runs and threads, so every record with a
/// given location is routed to the same accumulator.
#[must_use]
pub fn partition_for(key: &str, partitions: usize) -> usize {
    if partitions <= 1 {
        return 0;
    }
    let mut h = FxHasher::default();
    key.hash(&mut h);
    (h.finish() % partitions as u64) as usize
}

/// Split `v` into at most `n` contiguous chunks of roughly equal length.
pub(crate) fn split_vec<T>(v: Vec<T>, n: usize) -> Vec<Vec<T>> {
    let len = v.len();
    if n <= 1 || len <= 1 {
        return vec![v];
    }
    let chunk = len.div_ceil(n);
    let mut out = Vec::with_capacity(n);
    let mut rest = v;
    while rest.len() > chunk {
        let tail = rest.split_off(chunk);
        out.push(rest);
        rest = tail;
    }
    out.push(rest);
    out
}
