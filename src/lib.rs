//! sledge - a multi-database JSON document store
//!
//! Documents live in named databases that are created on first write. A
//! write names its document id explicitly, asks for a generated one
//! (`_auto`, `_auto_time`) or points at a body field holding it (`id_path`).
//! Reads can carry a channel: an ordered list of stages that derive a
//! transformed view of one or all documents without touching what is stored.
#![warn(missing_docs)]

// Configure global allocator for maximum performance
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

pub mod constants;

// Core foundational modules
pub mod core;
pub mod types;

// Main functional modules
pub mod channel;
pub mod identity;
pub mod ids;
pub mod service;
pub mod storage;

// Outer surfaces
pub mod api;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{AppState, Config, Error, ErrorKind, Result};
pub use service::Sledge;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
