//! Stage trait and compiled channels

use std::fmt;

use crate::channel::StageError;
use crate::types::Document;

/// One step of a channel
///
/// A stage reads zero or more fields of the working copy and writes or
/// overwrites fields in place. Stages hold only their own configuration, so
/// one compiled channel can run on many threads at once.
pub trait Stage: Send + Sync + fmt::Debug {
    /// Tag the stage was registered under
    fn name(&self) -> &'static str;

    /// Apply the stage to a working copy
    fn apply(&self, doc: &mut Document) -> Result<(), StageError>;
}

/// An ordered, validated sequence of stages
#[derive(Debug, Default)]
pub struct Channel {
    stages: Vec<Box<dyn Stage>>,
}

impl Channel {
    /// Wrap compiled stages
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Run every stage, in order, over a private copy of `doc`
    ///
    /// The input is never touched. The first failing stage aborts the run.
    pub fn run(&self, doc: &Document) -> Result<Document, StageError> {
        let mut working = doc.clone();
        for stage in &self.stages {
            stage.apply(&mut working)?;
        }
        Ok(working)
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether this channel has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage tags, in execution order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}
