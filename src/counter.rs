//! Per-location event counting.
//!
//! A [`KeyedCounter`] is a single-writer accumulator: it groups records by
//! location and keeps one running count per key. It has two states:
//!
//! - `Accumulating` -- accepts [`ingest`](KeyedCounter::ingest) and
//!   [`merge`](KeyedCounter::merge).
//! - `Finalized` -- read-only; [`finalize`](KeyedCounter::finalize) may be
//!   called again and returns the same result.
//!
//! Counting is expressed with the [`CombineFn`] protocol (create, add, merge,
//! finish) so partial counters built on different workers reduce to the same
//! result regardless of how the input was split.

use crate::record::ActivityRecord;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// A combine-by-key aggregation.
pub trait CombineFn<V, A, O>: Send + Sync + 'static {
    fn create(&self) -> A;
    fn add_input(&self, acc: &mut A, v: V);
    fn merge(&self, acc: &mut A, other: A);
    fn finish(&self, acc: &A) -> O;
}

/// Number of inputs per key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl<V> CombineFn<V, u64, u64> for Count {
    fn create(&self) -> u64 {
        0
    }
    fn add_input(&self, acc: &mut u64, _v: V) {
        *acc += 1;
    }
    fn merge(&self, acc: &mut u64, other: u64) {
        *acc += other;
    }
    fn finish(&self, acc: &u64) -> u64 {
        *acc
    }
}

const COUNT: &dyn CombineFn<(), u64, u64> = &Count;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CounterError {
    #[error("counter is finalized and accepts no further input")]
    Finalized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterState {
    Accumulating,
    Finalized,
}

/// Running count of records per location.
#[derive(Clone, Debug)]
pub struct KeyedCounter {
    counts: FxHashMap<String, u64>,
    state: CounterState,
}

impl Default for KeyedCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: FxHashMap::default(),
            state: CounterState::Accumulating,
        }
    }

    pub fn state(&self) -> CounterState {
        self.state
    }

    pub fn is_finalized(&self) -> bool {
        self.state == CounterState::Finalized
    }

    /// Count one record under its location.
    ///
    /// # Errors
    ///
    /// [`CounterError::Finalized`] if the counter was already finalized.
    pub fn ingest(&mut self, record: &ActivityRecord) -> Result<(), CounterError> {
        self.ingest_key(record.location())
    }

    /// Count one occurrence of `key`.
    ///
    /// # Errors
    ///
    /// [`CounterError::Finalized`] if the counter was already finalized.
    pub fn ingest_key(&mut self, key: &str) -> Result<(), CounterError> {
        self.ensure_open()?;
        // avoid allocating the key on the hot path once it exists
        match self.counts.get_mut(key) {
            Some(acc) => COUNT.add_input(acc, ()),
            None => {
                let mut acc = COUNT.create();
                COUNT.add_input(&mut acc, ());
                self.counts.insert(key.to_string(), acc);
            }
        }
        Ok(())
    }

    /// Fold a partial counter into this one, summing counts per key.
    ///
    /// # Errors
    ///
    /// [`CounterError::Finalized`] if this counter was already finalized.
    pub fn merge(&mut self, other: KeyedCounter) -> Result<(), CounterError> {
        self.ensure_open()?;
        for (key, partial) in other.counts {
            let acc = self
                .counts
                .entry(key)
                .or_insert_with(|| COUNT.create());
            COUNT.merge(acc, partial);
        }
        Ok(())
    }

    /// Close the counter and return one `(location, count)` per distinct key.
    ///
    /// Order is unspecified. Calling this again returns the same entries.
    pub fn finalize(&mut self) -> Vec<(String, u64)> {
        self.state = CounterState::Finalized;
        self.snapshot()
    }

    /// Current counts, in either state.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.counts
            .iter()
            .map(|(k, acc)| (k.clone(), COUNT.finish(acc)))
            .collect()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    /// Number of distinct keys seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total records counted across all keys.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    fn ensure_open(&self) -> Result<(), CounterError> {
        match self.state {
            CounterState::Accumulating => Ok(()),
            CounterState::Finalized => Err(CounterError::Finalized),
        }
    }
}

/// Render one output line: `"<location>: <count>"`.
#[must_use]
pub fn format_count(location: &str, count: u64) -> String {
    format!("{location}: {count}")
}
