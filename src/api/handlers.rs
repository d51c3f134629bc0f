//! HTTP request handlers for the sledge API
//!
//! Handlers only translate between HTTP and the core: they parse path tokens
//! and bodies, call the [`Sledge`](crate::service::Sledge) service and map
//! its envelope back to a response.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;

use super::reply::respond;
use crate::channel::CancellationFlag;
use crate::constants::CHANNEL_KEYSPACE;
use crate::core::{AppState, Error};
use crate::service::{ReadRequest, Sledge, TransformRequest, WriteRequest};
use crate::storage::RangeOptions;
use crate::types::{Envelope, PathToken};

/// Query parameters accepted by writes
#[derive(Debug, Default, Deserialize)]
pub struct WriteQuery {
    /// Dot path of the body field holding the document id
    pub id_path: Option<String>,
}

/// Query parameters accepted by reads and transforms
///
/// The range options only apply to `_all` targets. `channel` names a stored
/// channel and is only read by `GET`; a `POST` carries its channel in the body.
#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    /// Entries to drop from the start
    pub skip: Option<usize>,
    /// Maximum number of entries
    pub limit: Option<usize>,
    /// Stop before this id
    pub until_key: Option<String>,
    /// Walk ids from last to first
    pub direction_reverse: Option<bool>,
    /// Stored channel to run over the result
    pub channel: Option<String>,
}

impl ReadQuery {
    fn range(&self) -> RangeOptions {
        RangeOptions {
            skip: self.skip,
            limit: self.limit,
            until_key: self.until_key.clone(),
            reverse: self.direction_reverse.unwrap_or(false),
        }
    }
}

/// Raises its flag when dropped
///
/// Held by the request future; a client that disconnects drops the future
/// and stops the blocking transform at the next document boundary.
struct CancelOnDrop(CancellationFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

fn parse_body(db: &str, body: &Bytes) -> Result<Value, Response> {
    serde_json::from_slice(body).map_err(|err| respond(Envelope::failure(Some(db.to_string()), &Error::from(err))))
}

/// Run a service call that may execute a channel on the blocking pool
///
/// Dropping the request future cancels the run at the next document.
async fn run_blocking<F>(state: AppState, db: String, job: F) -> Response
where
    F: FnOnce(&Sledge, &CancellationFlag) -> Envelope + Send + 'static,
{
    let cancel = CancellationFlag::new();
    let _guard = CancelOnDrop(cancel.clone());
    let service = state.service.clone();

    match tokio::task::spawn_blocking(move || job(&*service, &cancel)).await {
        Ok(envelope) => respond(envelope),
        Err(err) => {
            tracing::error!(db = %db, error = %err, "blocking task failed");
            respond(Envelope::failure(Some(db), &Error::internal(err.to_string())))
        }
    }
}

/// Health check
pub async fn health_check() -> &'static str {
    "Ok!"
}

/// Prometheus metrics in text format
pub async fn metrics(State(state): State<AppState>) -> Response {
    if !state.config.metrics.enable_prometheus {
        return StatusCode::NOT_FOUND.into_response();
    }

    match state.service.metrics().encode() {
        Ok(text) => (StatusCode::OK, [(CONTENT_TYPE, "text/plain; version=0.0.4")], text).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /_db/_all`
pub async fn list_databases(State(state): State<AppState>) -> Response {
    respond(state.service.list_databases())
}

/// `PUT /_db/:db`
pub async fn write_document(
    State(state): State<AppState>,
    Path(db): Path<String>,
    Query(query): Query<WriteQuery>,
    body: Bytes,
) -> Response {
    write(state, db, None, query, body)
}

/// `PUT /_db/:db/:token`
pub async fn write_document_at(
    State(state): State<AppState>,
    Path((db, token)): Path<(String, String)>,
    Query(query): Query<WriteQuery>,
    body: Bytes,
) -> Response {
    write(state, db, Some(PathToken::parse(&token)), query, body)
}

fn write(state: AppState, db: String, target: Option<PathToken>, query: WriteQuery, body: Bytes) -> Response {
    let body = match parse_body(&db, &body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    respond(state.service.write(WriteRequest {
        db,
        target,
        id_path: query.id_path,
        body,
    }))
}

/// `GET /_db/:db`
///
/// A read must name its document in the path.
pub async fn read_without_id(Path(db): Path<String>) -> Response {
    respond(Envelope::failure(Some(db), &Error::MissingId))
}

/// `GET /_db/:db/:id` and `GET /_db/:db/_all`
///
/// Reads through a stored channel run on the blocking pool.
pub async fn read_documents(
    State(state): State<AppState>,
    Path((db, token)): Path<(String, String)>,
    Query(query): Query<ReadQuery>,
) -> Response {
    let target = match PathToken::parse(&token).into_read_target() {
        Ok(target) => target,
        Err(err) => return respond(Envelope::failure(Some(db), &err)),
    };
    let request = ReadRequest {
        db: db.clone(),
        target,
        range: query.range(),
        channel: query.channel,
    };

    if request.channel.is_none() {
        return respond(state.service.query(request, &CancellationFlag::new()));
    }
    run_blocking(state, db, move |service, cancel| service.query(request, cancel)).await
}

/// `POST /_db/:db/:id` and `POST /_db/:db/_all`
///
/// The channel runs on the blocking pool.
pub async fn transform_documents(
    State(state): State<AppState>,
    Path((db, token)): Path<(String, String)>,
    Query(query): Query<ReadQuery>,
    body: Bytes,
) -> Response {
    let target = match PathToken::parse(&token).into_read_target() {
        Ok(target) => target,
        Err(err) => return respond(Envelope::failure(Some(db), &err)),
    };
    let body = match parse_body(&db, &body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let request = TransformRequest {
        db: db.clone(),
        target,
        range: query.range(),
        body,
    };
    run_blocking(state, db, move |service, cancel| service.transform(request, cancel)).await
}

/// `PUT /_channel/:name`
pub async fn put_channel(State(state): State<AppState>, Path(name): Path<String>, body: Bytes) -> Response {
    let body = match parse_body(CHANNEL_KEYSPACE, &body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    respond(state.service.put_channel(&name, body))
}
