//! Metrics collection for sledge
//!
//! Counters are registered on a [`Registry`] owned by the [`Metrics`]
//! instance rather than on the prometheus default registry, so several
//! services can live in one process (tests do this all the time).

use crate::core::Result;
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Document operation counters
pub struct OperationMetrics {
    /// Total number of documents stored under a new id
    pub documents_written: IntCounter,
    /// Total number of writes that replaced an existing document
    pub documents_replaced: IntCounter,
    /// Total number of documents returned by reads
    pub documents_read: IntCounter,
    /// Total number of failed operations
    pub operations_failed: IntCounter,
}

/// Id generation counters
pub struct IdMetrics {
    /// Total number of `_auto` ids generated
    pub random_ids: IntCounter,
    /// Total number of `_auto_time` ids generated
    pub time_ordered_ids: IntCounter,
}

/// Channel counters
pub struct ChannelMetrics {
    /// Total number of transform requests that compiled and ran
    pub transforms_run: IntCounter,
    /// Total number of documents pushed through a channel
    pub documents_transformed: IntCounter,
    /// Total number of per-document stage failures
    pub stage_failures: IntCounter,
    /// Total number of bulk runs stopped by cancellation
    pub transforms_cancelled: IntCounter,
}

/// All sledge metrics and the registry they are registered on
pub struct Metrics {
    registry: Registry,
    /// Document operations
    pub operations: OperationMetrics,
    /// Id generation
    pub ids: IdMetrics,
    /// Channel execution
    pub channel: ChannelMetrics,
    /// Number of databases that exist
    pub databases: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl Metrics {
    /// Create and register every metric on a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let operations = OperationMetrics {
            documents_written: counter(&registry, "sledge_documents_written_total", "Documents stored under a new id")?,
            documents_replaced: counter(
                &registry,
                "sledge_documents_replaced_total",
                "Writes that replaced an existing document",
            )?,
            documents_read: counter(&registry, "sledge_documents_read_total", "Documents returned by reads")?,
            operations_failed: counter(&registry, "sledge_operations_failed_total", "Operations that returned an error")?,
        };

        let ids = IdMetrics {
            random_ids: counter(&registry, "sledge_random_ids_total", "Random ids generated")?,
            time_ordered_ids: counter(&registry, "sledge_time_ordered_ids_total", "Time-ordered ids generated")?,
        };

        let channel = ChannelMetrics {
            transforms_run: counter(&registry, "sledge_transforms_total", "Transform requests executed")?,
            documents_transformed: counter(
                &registry,
                "sledge_documents_transformed_total",
                "Documents pushed through a channel",
            )?,
            stage_failures: counter(&registry, "sledge_stage_failures_total", "Per-document stage failures")?,
            transforms_cancelled: counter(
                &registry,
                "sledge_transforms_cancelled_total",
                "Bulk transforms stopped by cancellation",
            )?,
        };

        let databases = IntGauge::with_opts(Opts::new("sledge_databases", "Databases that exist"))?;
        registry.register(Box::new(databases.clone()))?;

        Ok(Self {
            registry,
            operations,
            ids,
            channel,
            databases,
        })
    }

    /// Render every metric in the prometheus text format
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| crate::core::Error::internal(err.to_string()))
    }
}
