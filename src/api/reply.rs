//! Envelope to HTTP response mapping
//!
//! Wire shape: `{"result": {"error", "cause", "kind", "db"}, ...}`, with `cause`
//! always present and `null` on success, where writes
//! add `id`, reads and transforms add `data`, and bulk transforms also add
//! `complete`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::ErrorKind;
use crate::types::{Envelope, Payload};

#[derive(Serialize)]
struct ResultHeader<'a> {
    error: bool,
    cause: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<&'a str>,
}

/// Status code for an envelope
pub fn status_for(envelope: &Envelope) -> StatusCode {
    match envelope.kind {
        None => StatusCode::OK,
        Some(ErrorKind::DatabaseNotFound | ErrorKind::DocumentNotFound | ErrorKind::ChannelNotFound) => {
            StatusCode::NOT_FOUND
        }
        Some(ErrorKind::StageFieldMissing | ErrorKind::StageTypeMismatch) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(ErrorKind::IdCollision | ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        Some(_) => StatusCode::BAD_REQUEST,
    }
}

/// JSON body for an envelope
pub fn body_for(envelope: &Envelope) -> Value {
    let header = ResultHeader {
        error: envelope.error,
        cause: envelope.cause.as_deref(),
        kind: envelope.kind,
        db: envelope.db.as_deref(),
    };

    let mut body = Map::new();
    body.insert("result".to_string(), serde_json::to_value(header).unwrap_or(Value::Null));

    match &envelope.payload {
        Payload::Empty => {}
        Payload::Written { id, .. } => {
            body.insert("id".to_string(), Value::String(id.clone()));
        }
        Payload::Document(document) => {
            body.insert("data".to_string(), document.clone());
        }
        Payload::Documents(documents) => {
            body.insert("data".to_string(), Value::Array(documents.clone()));
        }
        Payload::Databases(names) => {
            body.insert(
                "data".to_string(),
                Value::Array(names.iter().cloned().map(Value::String).collect()),
            );
        }
        Payload::Batch { outcomes, complete } => {
            body.insert(
                "data".to_string(),
                serde_json::to_value(outcomes).unwrap_or_else(|_| Value::Array(Vec::new())),
            );
            body.insert("complete".to_string(), Value::Bool(*complete));
        }
    }

    Value::Object(body)
}

/// Turn an envelope into a response
pub fn respond(envelope: Envelope) -> Response {
    (status_for(&envelope), Json(body_for(&envelope))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::channel::StageError;
    use serde_json::json;

    #[test]
    fn test_write_body() {
        let envelope = Envelope::ok(
            Some("test_db".to_string()),
            Payload::Written {
                id: "world".to_string(),
                replaced: false,
            },
        );
        assert_eq!(status_for(&envelope), StatusCode::OK);
        assert_eq!(
            serde_json::to_string(&body_for(&envelope)).unwrap(),
            r#"{"result":{"error":false,"cause":null,"db":"test_db"},"id":"world"}"#
        );
    }

    #[test]
    fn test_error_statuses() {
        let db = Some("db".to_string());
        let status = |err: Error| status_for(&Envelope::failure(db.clone(), &err));

        assert_eq!(status(Error::MissingId), StatusCode::BAD_REQUEST);
        assert_eq!(status(Error::DatabaseNotFound("db".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(Error::IdCollision(8)), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status(Error::from(StageError::FieldMissing {
                stage: "join",
                field: "a".into()
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(Error::from(StageError::UnknownStageType("grok".into()))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_body_has_cause_and_kind() {
        let body = body_for(&Envelope::failure(Some("db".to_string()), &Error::MissingId));
        assert_eq!(body["result"]["error"], true);
        assert_eq!(body["result"]["kind"], "missing_id");
        assert!(body["result"]["cause"].as_str().unwrap().contains("no id"));
        assert!(body.get("data").is_none());
    }
}
