//! Per-prefix sequence counters

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// One monotonically increasing counter per prefix
///
/// Owned by a [`Database`](crate::storage::Database), which makes the
/// counters per (database, prefix).
#[derive(Debug, Default)]
pub struct SequenceCounters {
    counters: DashMap<String, Arc<Mutex<u64>>>,
}

impl SequenceCounters {
    /// Advance the counter for `prefix` and run `f` with the new value
    ///
    /// The first value for a prefix is 1. The prefix stays locked until `f`
    /// returns, so whatever `f` does with value `n` completes before any
    /// caller sees `n + 1`. Other prefixes are not blocked.
    pub fn next_with<T>(&self, prefix: &str, f: impl FnOnce(u64) -> T) -> T {
        let counter = self.counter(prefix);
        let mut value = counter.lock();
        *value += 1;
        f(*value)
    }

    fn counter(&self, prefix: &str) -> Arc<Mutex<u64>> {
        if let Some(counter) = self.counters.get(prefix) {
            return Arc::clone(counter.value());
        }

        Arc::clone(
            self.counters
                .entry(prefix.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(0)))
                .value(),
        )
    }
}
