//! # API Module
//!
//! Thin HTTP adapter over the core operations.
//!
//! ## Endpoints Overview
//!
//! ### Documents
//! - `PUT /_db/{db}?id_path={path}` - Write, id taken from a body field
//! - `PUT /_db/{db}/{id}` - Write under an explicit id
//! - `PUT /_db/{db}/_auto` - Write under a random id
//! - `PUT /_db/{db}/_auto_time` - Write under a time-ordered id
//! - `GET /_db/{db}/{id}` - Read one document
//! - `GET /_db/{db}/_all` - Read every document, ordered by id
//! - `GET /_db/{db}` - Always fails: a read must name its document
//!
//! `_all` reads and transforms accept `skip`, `limit`, `until_key` and
//! `direction_reverse` query parameters. `GET` also accepts `channel={name}`
//! to run a stored channel over the result.
//!
//! ### Transforms
//! - `POST /_db/{db}/{id}` - Run the body's `channel` over one document
//! - `POST /_db/{db}/_all` - Run the body's `channel` over every document
//! - `PUT /_channel/{name}` - Store a channel definition for `?channel=` reads
//!
//! ### System
//! - `GET /_db/_all` - List databases
//! - `GET /healthz` - Health check
//! - `GET /metrics` - Prometheus metrics

pub mod handlers;
pub mod reply;
pub mod server;

pub use server::{create_app, start_server};
