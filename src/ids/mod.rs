//! Document id generation
//!
//! `_auto` ids are random base62 tokens checked against the target database;
//! `_auto_time` ids are `<prefix>_<n>` with `n` drawn from an atomic counter
//! owned by the database.

/// Random and time-ordered generators
pub mod generator;

/// Per-prefix atomic counters
pub mod sequence;

pub use generator::{IdGenerator, RandomSource, ThreadRngSource};
pub use sequence::SequenceCounters;
