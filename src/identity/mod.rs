//! Identity resolution for writes
//!
//! A write names its document id in one of several ways. [`IdentitySource::select`]
//! applies the precedence rules to the typed path token and the optional
//! `id_path` query parameter; [`store`] turns the selected source into the
//! final id and writes the document under it, calling the id generator for
//! the sentinels.

mod resolver;

pub use resolver::{store, IdentitySource, Stored};
