//! Random and time-ordered id generation

use rand::{rng, Rng};

use crate::constants::{BASE62_CHARS, TIME_ID_SEPARATOR};
use crate::core::config::IdConfig;
use crate::core::{Error, Result};
use crate::storage::Database;
use crate::types::Document;

/// Source of random id candidates
pub trait RandomSource: Send + Sync {
    /// Produce a candidate id of `len` characters
    fn token(&self, len: usize) -> String;
}

/// Base62 tokens drawn from the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn token(&self, len: usize) -> String {
        let mut rng = rng();
        (0..len)
            .map(|_| BASE62_CHARS[rng.random_range(0..BASE62_CHARS.len())] as char)
            .collect()
    }
}

/// Generates ids for `_auto` and `_auto_time` writes
pub struct IdGenerator {
    config: IdConfig,
    source: Box<dyn RandomSource>,
}

impl IdGenerator {
    /// Generator backed by the thread-local RNG
    pub fn new(config: IdConfig) -> Self {
        Self::with_source(config, Box::new(ThreadRngSource))
    }

    /// Generator with a custom randomness source
    pub fn with_source(config: IdConfig, source: Box<dyn RandomSource>) -> Self {
        Self { config, source }
    }

    /// Store `doc` under a fresh random base62 id and return the id
    ///
    /// Each candidate is claimed with an insert-if-absent, so two writers can
    /// never both win the same id. Taken candidates are redrawn, up to
    /// `max_random_retries` attempts.
    pub fn put_random(&self, db: &Database, doc: Document) -> Result<String> {
        let attempts = self.config.max_random_retries;
        let mut doc = doc;
        for attempt in 1..=attempts {
            let candidate = self.source.token(self.config.random_length);
            match db.insert_new(&candidate, doc) {
                Ok(()) => return Ok(candidate),
                Err(rejected) => doc = rejected,
            }
            tracing::warn!(db = db.name(), attempt, "random id collision, retrying");
        }

        tracing::error!(db = db.name(), attempts, "random id generation exhausted its retries");
        Err(Error::IdCollision(attempts))
    }

    /// Store `doc` under the next `<prefix>_<n>` id for `db`
    ///
    /// Drawing `n` and storing the document happen while the prefix is
    /// locked, so ids land in the store in generation order. Returns the id
    /// and whether an entry was replaced.
    pub fn put_time_ordered(&self, db: &Database, doc: Document) -> (String, bool) {
        let prefix = self.config.prefix_for(db.name());
        db.sequences().next_with(prefix, |n| {
            let id = format!("{}{}{}", prefix, TIME_ID_SEPARATOR, n);
            let replaced = db.put(&id, doc);
            (id, replaced)
        })
    }
}
