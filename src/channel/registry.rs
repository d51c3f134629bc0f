//! Tag to stage builder lookup

use serde_json::Value;
use std::collections::HashMap;

use crate::channel::stages;
use crate::channel::{Channel, Stage, StageError};

/// Builds a stage from its JSON definition (the whole `{"type": ..}` object)
pub type StageBuilder = fn(&Value) -> Result<Box<dyn Stage>, StageError>;

/// Maps stage tags to their builders
///
/// Adding a stage kind means registering one more builder; the executor
/// never changes.
#[derive(Clone, Default)]
pub struct StageRegistry {
    builders: HashMap<String, StageBuilder>,
}

impl StageRegistry {
    /// Registry without any stage kinds
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every builtin stage kind
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        stages::register_builtin(&mut registry);
        registry
    }

    /// Register or replace the builder for `tag`
    pub fn register(&mut self, tag: impl Into<String>, builder: StageBuilder) {
        self.builders.insert(tag.into(), builder);
    }

    /// Whether a builder exists for `tag`
    pub fn contains(&self, tag: &str) -> bool {
        self.builders.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Compile a list of stage definitions into a [`Channel`]
    ///
    /// Fails on the first definition that is not an object, lacks a string
    /// `type`, names an unregistered tag, or is rejected by its builder.
    pub fn compile(&self, definitions: &[Value]) -> Result<Channel, StageError> {
        let mut compiled = Vec::with_capacity(definitions.len());

        for (position, definition) in definitions.iter().enumerate() {
            let tag = definition
                .as_object()
                .and_then(|object| object.get("type"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    StageError::invalid(
                        format!("#{}", position),
                        "stage must be an object with a string 'type'",
                    )
                })?;

            let builder = self
                .builders
                .get(tag)
                .ok_or_else(|| StageError::UnknownStageType(tag.to_string()))?;

            compiled.push(builder(definition)?);
        }

        Ok(Channel::new(compiled))
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry").field("tags", &self.tags()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;
    use serde_json::json;

    #[derive(Debug)]
    struct Stamp;

    impl Stage for Stamp {
        fn name(&self) -> &'static str {
            "stamp"
        }

        fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
            doc.insert("stamped".to_string(), Value::Bool(true));
            Ok(())
        }
    }

    fn build_stamp(_: &Value) -> Result<Box<dyn Stage>, StageError> {
        Ok(Box::new(Stamp))
    }

    #[test]
    fn test_builtin_tags() {
        let registry = StageRegistry::with_builtin();
        for tag in [
            "append", "join", "lowercase", "remove", "rename", "set", "sort", "split", "trim", "trim_space",
            "uppercase",
        ] {
            assert!(registry.contains(tag), "missing {}", tag);
        }
    }

    #[test]
    fn test_custom_stage_needs_no_executor_change() {
        let mut registry = StageRegistry::with_builtin();
        registry.register("stamp", build_stamp);

        let channel = registry
            .compile(&[json!({"type": "stamp"}), json!({"type": "remove", "field": "a"})])
            .unwrap();
        assert_eq!(channel.stage_names(), vec!["stamp", "remove"]);

        let doc = crate::types::document::document_from_value(json!({"a": 1})).unwrap();
        let out = channel.run(&doc).unwrap();
        assert_eq!(Value::Object(out), json!({"stamped": true}));
    }

    #[test]
    fn test_compile_rejections() {
        let registry = StageRegistry::with_builtin();

        assert_eq!(
            registry.compile(&[json!({"type": "grok"})]).unwrap_err(),
            StageError::UnknownStageType("grok".to_string())
        );
        assert!(matches!(
            registry.compile(&[json!("join")]).unwrap_err(),
            StageError::InvalidStage { .. }
        ));
        assert!(matches!(
            registry.compile(&[json!({"type": "rename", "field": "a"})]).unwrap_err(),
            StageError::InvalidStage { stage, .. } if stage == "rename"
        ));
    }

    #[test]
    fn test_empty_channel_is_identity() {
        let channel = StageRegistry::with_builtin().compile(&[]).unwrap();
        assert!(channel.is_empty());

        let doc = crate::types::document::document_from_value(json!({"a": [1, 2]})).unwrap();
        assert_eq!(channel.run(&doc).unwrap(), doc);
    }
}
