//! Core operations of the store
//!
//! [`Sledge`] ties the database registry, the id generator and the channel
//! engine together. Each operation comes in two forms: `try_*` returns a
//! [`Result`], the plain form folds that result into an [`Envelope`] the way
//! callers outside the core expect it.

use serde_json::Value;
use std::sync::Arc;

use crate::channel::{CancellationFlag, ChannelEngine};
use crate::constants::CHANNEL_KEYSPACE;
use crate::core::{Config, Error, Result};
use crate::identity::{store, IdentitySource, Stored};
use crate::ids::IdGenerator;
use crate::storage::{create_storage_factory, Database, DatabaseRegistry, RangeOptions};
use crate::system::Metrics;
use crate::types::document::{document_from_value, with_id};
use crate::types::{BatchItem, Envelope, PathToken, Payload, ReadTarget};

/// A write request
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Target database, created on first write
    pub db: String,
    /// Last path segment, if the request has one
    pub target: Option<PathToken>,
    /// Dot path of the body field holding the id
    pub id_path: Option<String>,
    /// Document to store; must be a JSON object
    pub body: Value,
}

/// A read request
#[derive(Debug, Clone)]
pub struct ReadRequest {
    /// Database to read from
    pub db: String,
    /// One document or all of them
    pub target: ReadTarget,
    /// Window over a read of every document
    pub range: RangeOptions,
    /// Name of a stored channel to run over the result
    pub channel: Option<String>,
}

/// A transform request
#[derive(Debug, Clone)]
pub struct TransformRequest {
    /// Database to read from
    pub db: String,
    /// One document or all of them
    pub target: ReadTarget,
    /// Window over a bulk transform
    pub range: RangeOptions,
    /// Request body holding the `channel` array
    pub body: Value,
}

/// The document store service
pub struct Sledge {
    registry: Arc<DatabaseRegistry>,
    ids: IdGenerator,
    engine: ChannelEngine,
    metrics: Arc<Metrics>,
}

impl Sledge {
    /// Assemble a service from its parts
    pub fn new(registry: Arc<DatabaseRegistry>, ids: IdGenerator, engine: ChannelEngine, metrics: Arc<Metrics>) -> Self {
        Self {
            registry,
            ids,
            engine,
            metrics,
        }
    }

    /// Build every part from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let factory = create_storage_factory(&config.storage)?;
        Ok(Self::new(
            Arc::new(DatabaseRegistry::new(factory)),
            IdGenerator::new(config.ids.clone()),
            ChannelEngine::new(&config.channel),
            Arc::new(Metrics::new()?),
        ))
    }

    /// Database registry
    pub fn registry(&self) -> &DatabaseRegistry {
        &self.registry
    }

    /// Service metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Store a document, resolving its id first
    pub fn write(&self, request: WriteRequest) -> Envelope {
        let db = request.db.clone();
        self.finish("write", db, self.try_write(request))
    }

    /// Store a document, resolving its id first
    ///
    /// Nothing is stored, and no database is created, when the id cannot be
    /// resolved.
    pub fn try_write(&self, request: WriteRequest) -> Result<Payload> {
        let WriteRequest {
            db,
            target,
            id_path,
            body,
        } = request;

        if db.is_empty() {
            return Err(Error::invalid_input("database name cannot be empty"));
        }

        let source = IdentitySource::select(target.as_ref(), id_path.as_deref())?;
        let body = document_from_value(body)?;
        source.supplied_id(&body)?;

        let database = self.registry.get_or_create(&db);
        self.metrics.databases.set(self.registry.database_count() as i64);

        let Stored { id, replaced } = store(&source, &database, body, &self.ids)?;
        match source {
            IdentitySource::Random => self.metrics.ids.random_ids.inc(),
            IdentitySource::TimeOrdered => self.metrics.ids.time_ordered_ids.inc(),
            _ => {}
        }

        if replaced {
            self.metrics.operations.documents_replaced.inc();
        } else {
            self.metrics.operations.documents_written.inc();
        }

        tracing::debug!(db = %db, id = %id, replaced, "document stored");
        Ok(Payload::Written { id, replaced })
    }

    /// Read one document or a range of them, optionally through a stored channel
    pub fn query(&self, request: ReadRequest, cancel: &CancellationFlag) -> Envelope {
        let db = request.db.clone();
        self.finish("read", db, self.try_query(request, cancel))
    }

    /// Read one document or a range of them, optionally through a stored channel
    ///
    /// With a channel name the read behaves exactly like a transform whose
    /// body is the stored channel definition.
    pub fn try_query(&self, request: ReadRequest, cancel: &CancellationFlag) -> Result<Payload> {
        let ReadRequest {
            db,
            target,
            range,
            channel,
        } = request;

        match (channel, target) {
            (Some(name), target) => {
                let body = self.stored_channel(&name)?;
                self.try_transform(
                    TransformRequest {
                        db,
                        target,
                        range,
                        body,
                    },
                    cancel,
                )
            }
            (None, ReadTarget::One(id)) => self.try_read_one(&db, &id),
            (None, ReadTarget::All) => self.try_read_all(&db, &range),
        }
    }

    /// Read one document with its implicit `id` field
    pub fn read_one(&self, db: &str, id: &str) -> Envelope {
        self.finish("read", db.to_string(), self.try_read_one(db, id))
    }

    /// Read one document with its implicit `id` field
    pub fn try_read_one(&self, db: &str, id: &str) -> Result<Payload> {
        let database = self.database(db)?;
        let doc = database.get(id).ok_or_else(|| Error::DocumentNotFound {
            db: db.to_string(),
            id: id.to_string(),
        })?;

        self.metrics.operations.documents_read.inc();
        Ok(Payload::Document(with_id(id, &doc)))
    }

    /// Read every document of a database, ordered by id
    pub fn read_all(&self, db: &str) -> Envelope {
        self.finish("read", db.to_string(), self.try_read_all(db, &RangeOptions::default()))
    }

    /// Read the documents of a database inside `range`, ordered by id
    pub fn try_read_all(&self, db: &str, range: &RangeOptions) -> Result<Payload> {
        let database = self.database(db)?;
        let documents: Vec<Value> = range
            .apply(database.get_all())
            .iter()
            .map(|(id, doc)| with_id(id, doc))
            .collect();

        self.metrics.operations.documents_read.inc_by(documents.len() as u64);
        Ok(Payload::Documents(documents))
    }

    /// Save a channel definition under `name` for later `?channel=` reads
    pub fn put_channel(&self, name: &str, body: Value) -> Envelope {
        self.finish(
            "put_channel",
            CHANNEL_KEYSPACE.to_string(),
            self.try_put_channel(name, body),
        )
    }

    /// Save a channel definition under `name` for later `?channel=` reads
    ///
    /// The definition is compiled first; one that would not compile is never
    /// stored.
    pub fn try_put_channel(&self, name: &str, body: Value) -> Result<Payload> {
        if name.is_empty() {
            return Err(Error::invalid_input("channel name cannot be empty"));
        }
        let channel = self.engine.compile(&body)?;
        let document = document_from_value(body)?;

        let replaced = self.registry.get_or_create(CHANNEL_KEYSPACE).put(name, document);
        self.metrics.databases.set(self.registry.database_count() as i64);
        tracing::info!(channel = name, stages = channel.len(), replaced, "channel stored");
        Ok(Payload::Written {
            id: name.to_string(),
            replaced,
        })
    }

    /// Names of every database, sorted
    pub fn list_databases(&self) -> Envelope {
        Envelope::ok(None, Payload::Databases(self.registry.names()))
    }

    /// Run a channel over stored documents without modifying them
    pub fn transform(&self, request: TransformRequest, cancel: &CancellationFlag) -> Envelope {
        let db = request.db.clone();
        self.finish("transform", db, self.try_transform(request, cancel))
    }

    /// Run a channel over stored documents without modifying them
    ///
    /// The channel is compiled before any document is read; an unknown or
    /// malformed stage fails the whole request. A single-document transform
    /// fails with the stage error. A bulk transform never fails because of a
    /// stage: each document gets its own outcome.
    pub fn try_transform(&self, request: TransformRequest, cancel: &CancellationFlag) -> Result<Payload> {
        let TransformRequest {
            db,
            target,
            range,
            body,
        } = request;

        let channel = self.engine.compile(&body)?;
        let database = self.database(&db)?;
        self.metrics.channel.transforms_run.inc();

        match target {
            ReadTarget::One(id) => {
                let doc = database.get(&id).ok_or_else(|| Error::DocumentNotFound {
                    db: db.clone(),
                    id: id.clone(),
                })?;
                self.metrics.channel.documents_transformed.inc();

                let transformed = self.engine.run_one(&channel, &id, &doc).map_err(|err| {
                    self.metrics.channel.stage_failures.inc();
                    Error::from(err)
                })?;
                Ok(Payload::Document(transformed))
            }
            ReadTarget::All => {
                let entries = range.apply(database.get_all());
                let run = self.engine.run_batch(&channel, &entries, cancel);

                self.metrics.channel.documents_transformed.inc_by(run.outcomes.len() as u64);
                if !run.complete {
                    self.metrics.channel.transforms_cancelled.inc();
                }

                let outcomes = run
                    .outcomes
                    .into_iter()
                    .map(|outcome| match outcome.result {
                        Ok(document) => BatchItem::success(outcome.id, document),
                        Err(err) => {
                            self.metrics.channel.stage_failures.inc();
                            BatchItem::failure(outcome.id, &Error::from(err))
                        }
                    })
                    .collect();

                Ok(Payload::Batch {
                    outcomes,
                    complete: run.complete,
                })
            }
        }
    }

    fn stored_channel(&self, name: &str) -> Result<Value> {
        self.registry
            .get(CHANNEL_KEYSPACE)
            .and_then(|channels| channels.get(name))
            .map(|definition| Value::Object((*definition).clone()))
            .ok_or_else(|| Error::ChannelNotFound(name.to_string()))
    }

    fn database(&self, name: &str) -> Result<Arc<Database>> {
        self.registry
            .get(name)
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))
    }

    fn finish(&self, operation: &'static str, db: String, result: Result<Payload>) -> Envelope {
        if let Err(err) = &result {
            self.metrics.operations.operations_failed.inc();
            if err.is_server_error() {
                tracing::error!(operation, db = %db, error = %err, "operation failed");
            } else {
                tracing::debug!(operation, db = %db, error = %err, "operation rejected");
            }
        }
        Envelope::from_result(Some(db), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use serde_json::json;

    fn sledge() -> Sledge {
        Sledge::from_config(&Config::default()).unwrap()
    }

    fn read_request(db: &str, target: ReadTarget) -> ReadRequest {
        ReadRequest {
            db: db.to_string(),
            target,
            range: RangeOptions::default(),
            channel: None,
        }
    }

    fn put(sledge: &Sledge, db: &str, target: Option<&str>, id_path: Option<&str>, body: Value) -> Envelope {
        sledge.write(WriteRequest {
            db: db.to_string(),
            target: target.map(PathToken::parse),
            id_path: id_path.map(str::to_string),
            body,
        })
    }

    #[test]
    fn test_write_with_path_id_then_read() {
        let sledge = sledge();
        let envelope = put(&sledge, "test_db", Some("d1"), None, json!({"a": 1}));
        assert!(!envelope.error);
        assert_eq!(envelope.written_id(), Some("d1"));
        assert_eq!(envelope.db.as_deref(), Some("test_db"));

        let read = sledge.read_one("test_db", "d1");
        assert_eq!(read.payload, Payload::Document(json!({"id": "d1", "a": 1})));
    }

    #[test]
    fn test_replace_reports_previous_entry() {
        let sledge = sledge();
        put(&sledge, "db", Some("d1"), None, json!({"v": 1}));
        let second = put(&sledge, "db", Some("d1"), None, json!({"v": 2}));
        assert_eq!(
            second.payload,
            Payload::Written {
                id: "d1".to_string(),
                replaced: true
            }
        );
        assert_eq!(sledge.metrics().operations.documents_replaced.get(), 1);
    }

    #[test]
    fn test_missing_id_stores_nothing_and_creates_no_database() {
        let sledge = sledge();
        let envelope = put(&sledge, "db", None, None, json!({"a": 1}));
        assert!(envelope.error);
        assert_eq!(envelope.kind, Some(ErrorKind::MissingId));
        assert_eq!(sledge.registry().database_count(), 0);

        let envelope = put(&sledge, "db", None, Some("hello"), json!({"a": 1}));
        assert_eq!(envelope.kind, Some(ErrorKind::MissingIdField));
        assert_eq!(sledge.registry().database_count(), 0);
    }

    #[test]
    fn test_non_object_body_rejected() {
        let sledge = sledge();
        let envelope = put(&sledge, "db", Some("x"), None, json!([1, 2]));
        assert_eq!(envelope.kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_reads_on_unknown_database_and_document() {
        let sledge = sledge();
        assert_eq!(sledge.read_all("nope").kind, Some(ErrorKind::DatabaseNotFound));

        put(&sledge, "db", Some("x"), None, json!({}));
        assert_eq!(sledge.read_one("db", "y").kind, Some(ErrorKind::DocumentNotFound));
        assert_eq!(
            sledge.query(read_request("db", ReadTarget::All), &CancellationFlag::new()).payload,
            Payload::Documents(vec![json!({"id": "x"})])
        );
    }

    #[test]
    fn test_read_all_with_range() {
        let sledge = sledge();
        for id in ["a", "b", "c", "d", "e"] {
            put(&sledge, "db", Some(id), None, json!({}));
        }

        let request = ReadRequest {
            range: RangeOptions {
                skip: Some(1),
                limit: Some(2),
                reverse: true,
                ..RangeOptions::default()
            },
            ..read_request("db", ReadTarget::All)
        };
        assert_eq!(
            sledge.query(request, &CancellationFlag::new()).payload,
            Payload::Documents(vec![json!({"id": "d"}), json!({"id": "c"})])
        );

        let until = RangeOptions {
            until_key: Some("c".to_string()),
            ..RangeOptions::default()
        };
        assert_eq!(
            sledge.try_read_all("db", &until).unwrap(),
            Payload::Documents(vec![json!({"id": "a"}), json!({"id": "b"})])
        );
    }

    #[test]
    fn test_stored_channel_applies_on_read() {
        let sledge = sledge();
        put(&sledge, "people", Some("d1"), None, json!({"name": "mario", "surname": "castro"}));

        let stored = sledge.put_channel(
            "full_name",
            json!({"channel": [{"type": "join", "field": ["name", "surname"], "separator": " ", "new_field": "full_name"}]}),
        );
        assert_eq!(stored.written_id(), Some("full_name"));

        let request = ReadRequest {
            channel: Some("full_name".to_string()),
            ..read_request("people", ReadTarget::One("d1".to_string()))
        };
        let envelope = sledge.query(request, &CancellationFlag::new());
        assert_eq!(
            envelope.payload,
            Payload::Document(json!({"id": "d1", "name": "mario", "surname": "castro", "full_name": "mario castro"}))
        );

        // the stored document is untouched
        assert_eq!(
            sledge.read_one("people", "d1").payload,
            Payload::Document(json!({"id": "d1", "name": "mario", "surname": "castro"}))
        );
    }

    #[test]
    fn test_stored_channel_errors() {
        let sledge = sledge();
        put(&sledge, "db", Some("x"), None, json!({}));

        let request = ReadRequest {
            channel: Some("nope".to_string()),
            ..read_request("db", ReadTarget::All)
        };
        assert_eq!(
            sledge.query(request, &CancellationFlag::new()).kind,
            Some(ErrorKind::ChannelNotFound)
        );

        let rejected = sledge.put_channel("bad", json!({"channel": [{"type": "grok"}]}));
        assert_eq!(rejected.kind, Some(ErrorKind::UnknownStageType));
        assert!(sledge.registry().get(CHANNEL_KEYSPACE).is_none());
    }

    #[test]
    fn test_list_databases_sorted() {
        let sledge = sledge();
        put(&sledge, "zeta", Some("1"), None, json!({}));
        put(&sledge, "alpha", Some("1"), None, json!({}));
        assert_eq!(
            sledge.list_databases().payload,
            Payload::Databases(vec!["alpha".to_string(), "zeta".to_string()])
        );
    }

    #[test]
    fn test_transform_compile_errors_fail_the_request() {
        let sledge = sledge();
        put(&sledge, "db", Some("x"), None, json!({}));

        let envelope = sledge.transform(
            TransformRequest {
                db: "db".to_string(),
                target: ReadTarget::All,
                range: RangeOptions::default(),
                body: json!({"channel": [{"type": "grok"}]}),
            },
            &CancellationFlag::new(),
        );
        assert!(envelope.error);
        assert_eq!(envelope.kind, Some(ErrorKind::UnknownStageType));
    }

    #[test]
    fn test_single_transform_stage_failure() {
        let sledge = sledge();
        put(&sledge, "db", Some("x"), None, json!({"name": "mario"}));

        let envelope = sledge.transform(
            TransformRequest {
                db: "db".to_string(),
                target: ReadTarget::One("x".to_string()),
                range: RangeOptions::default(),
                body: json!({"channel": [{"type": "rename", "field": "nope", "new_name": "b"}]}),
            },
            &CancellationFlag::new(),
        );
        assert_eq!(envelope.kind, Some(ErrorKind::StageFieldMissing));
        assert_eq!(sledge.metrics().channel.stage_failures.get(), 1);
    }
}
