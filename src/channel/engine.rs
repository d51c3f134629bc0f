//! Channel execution over one or many documents

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::channel::{Channel, StageError, StageRegistry};
use crate::constants::CHANNEL_FIELD;
use crate::core::config::ChannelConfig;
use crate::core::{Error, Result};
use crate::storage::Entry;
use crate::types::document::with_id;
use crate::types::Document;

/// Cooperative cancellation signal for bulk runs
///
/// Checked between documents; a document already being processed always
/// finishes.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// New, not yet cancelled flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of running a channel over one stored document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    /// Id of the source document
    pub id: String,
    /// Transformed document with its `id`, or the stage failure
    pub result: std::result::Result<Value, StageError>,
}

/// Outcomes of a bulk run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRun {
    /// Per-document outcomes, in input order
    pub outcomes: Vec<DocumentOutcome>,
    /// False when cancellation stopped the run early
    pub complete: bool,
}

/// Compiles channel specs and runs them
#[derive(Debug)]
pub struct ChannelEngine {
    registry: StageRegistry,
    parallel_threshold: usize,
    workers: usize,
}

impl ChannelEngine {
    /// Engine with the builtin stages and the given parallelism settings
    pub fn new(config: &ChannelConfig) -> Self {
        Self::with_registry(StageRegistry::with_builtin(), config)
    }

    /// Engine with a custom stage registry
    pub fn with_registry(registry: StageRegistry, config: &ChannelConfig) -> Self {
        Self {
            registry,
            parallel_threshold: config.parallel_threshold.max(1),
            workers: config.optimal_workers(),
        }
    }

    /// Compile the `channel` array of a transform request body
    pub fn compile(&self, body: &Value) -> Result<Channel> {
        let definitions = body
            .get(CHANNEL_FIELD)
            .ok_or_else(|| Error::InvalidChannel(format!("request body has no '{}' field", CHANNEL_FIELD)))?
            .as_array()
            .ok_or_else(|| Error::InvalidChannel(format!("'{}' must be an array of stages", CHANNEL_FIELD)))?;

        let channel = self.registry.compile(definitions)?;
        tracing::debug!(stages = ?channel.stage_names(), "compiled channel");
        Ok(channel)
    }

    /// Run a channel over one document
    ///
    /// The stored document is never modified; the returned value is a fresh
    /// view with the `id` field set after the last stage.
    pub fn run_one(&self, channel: &Channel, id: &str, doc: &Document) -> std::result::Result<Value, StageError> {
        channel.run(doc).map(|out| with_id(id, &out))
    }

    /// Run a channel over a snapshot of entries
    ///
    /// Each document is independent: a failing document yields a failed
    /// outcome and the run moves on. Large batches are split in contiguous
    /// chunks across worker threads; outcomes keep the input order. When the
    /// flag is raised the run stops early and only the leading run of
    /// finished outcomes is returned.
    pub fn run_batch(&self, channel: &Channel, entries: &[Entry], cancel: &CancellationFlag) -> BatchRun {
        let outcomes = if self.workers > 1 && entries.len() >= self.parallel_threshold {
            self.run_parallel(channel, entries, cancel)
        } else {
            self.run_sequential(channel, entries, cancel)
        };

        let complete = outcomes.len() == entries.len();
        if !complete {
            tracing::info!(done = outcomes.len(), total = entries.len(), "bulk transform cancelled");
        }

        BatchRun { outcomes, complete }
    }

    fn run_sequential(&self, channel: &Channel, entries: &[Entry], cancel: &CancellationFlag) -> Vec<DocumentOutcome> {
        let mut outcomes = Vec::with_capacity(entries.len());
        for (id, doc) in entries {
            if cancel.is_cancelled() {
                break;
            }
            outcomes.push(self.outcome(channel, id, doc));
        }
        outcomes
    }

    fn run_parallel(&self, channel: &Channel, entries: &[Entry], cancel: &CancellationFlag) -> Vec<DocumentOutcome> {
        let chunk_size = entries.len().div_ceil(self.workers);
        tracing::debug!(documents = entries.len(), chunk_size, "running bulk transform in parallel");

        let chunks: Vec<(usize, Vec<DocumentOutcome>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = entries
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = scope.spawn(move || self.run_sequential(channel, chunk, cancel));
                    (chunk.len(), handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(len, handle)| {
                    let outcomes = handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
                    (len, outcomes)
                })
                .collect()
        });

        let mut outcomes = Vec::with_capacity(entries.len());
        for (expected, chunk) in chunks {
            let finished = chunk.len() == expected;
            outcomes.extend(chunk);
            if !finished {
                break;
            }
        }
        outcomes
    }

    fn outcome(&self, channel: &Channel, id: &str, doc: &Document) -> DocumentOutcome {
        let result = self.run_one(channel, id, doc);
        if let Err(err) = &result {
            tracing::warn!(id, error = %err, "stage failed for document");
        }
        DocumentOutcome {
            id: id.to_string(),
            result,
        }
    }
}
