//! Channel pipeline engine
//!
//! A channel is an ordered list of stages supplied with a read request. It
//! produces a transformed view of stored documents and never writes back to
//! the store.
//!
//! Stage kinds are looked up by their `type` tag in a [`StageRegistry`], so a
//! new kind only needs a builder registered under its tag.

/// Stage errors
pub mod error;

/// Tag to builder lookup
pub mod registry;

/// Stage trait and compiled channels
pub mod stage;

/// Builtin stage kinds
pub mod stages;

/// Single and bulk execution
pub mod engine;

pub use engine::{BatchRun, CancellationFlag, ChannelEngine, DocumentOutcome};
pub use error::StageError;
pub use registry::{StageBuilder, StageRegistry};
pub use stage::{Channel, Stage};
