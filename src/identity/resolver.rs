use crate::core::{Error, Result};
use crate::ids::IdGenerator;
use crate::storage::Database;
use crate::types::document::{lookup_path, stringify};
use crate::types::{Document, PathToken};

/// Where the id of a write comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Literal id taken from the path
    Path(String),
    /// Fresh random id
    Random,
    /// Next time-ordered id for the database prefix
    TimeOrdered,
    /// Value of a body field, named by a dot path
    Field(String),
    /// Nothing names an id
    Absent,
}

impl IdentitySource {
    /// Pick the identity source of a write
    ///
    /// First match wins: `_auto`, `_auto_time`, a literal path id, then
    /// `id_path`. An `_all` path token is not a valid write target.
    pub fn select(token: Option<&PathToken>, id_path: Option<&str>) -> Result<Self> {
        match token {
            Some(PathToken::Auto) => Ok(IdentitySource::Random),
            Some(PathToken::AutoTime) => Ok(IdentitySource::TimeOrdered),
            Some(PathToken::Id(id)) => Ok(IdentitySource::Path(id.clone())),
            Some(PathToken::All) => Err(Error::ReservedToken(PathToken::All.to_string())),
            None => match id_path {
                Some(path) if !path.is_empty() => Ok(IdentitySource::Field(path.to_string())),
                _ => Ok(IdentitySource::Absent),
            },
        }
    }

    /// The id named by the request itself, if any
    ///
    /// Needs no database, so a write that cannot name its id fails before a
    /// database is created for it. Returns `None` for generated ids.
    pub fn supplied_id(&self, body: &Document) -> Result<Option<String>> {
        match self {
            IdentitySource::Path(id) => Ok(Some(id.clone())),
            IdentitySource::Field(path) => lookup_path(body, path)
                .map(|value| Some(stringify(value)))
                .ok_or_else(|| Error::MissingIdField(path.clone())),
            IdentitySource::Absent => Err(Error::MissingId),
            IdentitySource::Random | IdentitySource::TimeOrdered => Ok(None),
        }
    }
}

/// Where a write ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored {
    /// Id the document is stored under
    pub id: String,
    /// Whether an existing entry was replaced
    pub replaced: bool,
}

/// Resolve the id named by `source` and store `body` under it
///
/// Generated ids are claimed by the insert itself: a random id is only taken
/// if nobody holds it, and a time-ordered id is stored before the next one is
/// handed out.
pub fn store(source: &IdentitySource, db: &Database, body: Document, ids: &IdGenerator) -> Result<Stored> {
    if let Some(id) = source.supplied_id(&body)? {
        let replaced = db.put(&id, body);
        return Ok(Stored { id, replaced });
    }

    match source {
        IdentitySource::Random => Ok(Stored {
            id: ids.put_random(db, body)?,
            replaced: false,
        }),
        _ => {
            let (id, replaced) = ids.put_time_ordered(db, body);
            Ok(Stored { id, replaced })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::IdConfig;
    use crate::storage::MemStorage;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Document {
        crate::types::document::document_from_value(value).unwrap()
    }

    #[test]
    fn test_sentinels_win_over_id_path() {
        assert_eq!(
            IdentitySource::select(Some(&PathToken::Auto), Some("hello")).unwrap(),
            IdentitySource::Random
        );
        assert_eq!(
            IdentitySource::select(Some(&PathToken::AutoTime), Some("hello")).unwrap(),
            IdentitySource::TimeOrdered
        );
        assert_eq!(
            IdentitySource::select(Some(&PathToken::parse("x")), Some("hello")).unwrap(),
            IdentitySource::Path("x".to_string())
        );
    }

    #[test]
    fn test_id_path_and_absent() {
        assert_eq!(
            IdentitySource::select(None, Some("hello")).unwrap(),
            IdentitySource::Field("hello".to_string())
        );
        assert_eq!(IdentitySource::select(None, None).unwrap(), IdentitySource::Absent);
        assert_eq!(IdentitySource::select(None, Some("")).unwrap(), IdentitySource::Absent);
        assert!(matches!(
            IdentitySource::select(Some(&PathToken::All), None),
            Err(Error::ReservedToken(_))
        ));
    }

    #[test]
    fn test_store_under_field_values() {
        let db = Database::new("db", Box::new(MemStorage::new()));
        let ids = IdGenerator::new(IdConfig::default());

        let doc = body(json!({"hello": "world", "n": 42, "user": {"id": "u1"}, "gone": null}));
        let field = |p: &str| store(&IdentitySource::Field(p.to_string()), &db, doc.clone(), &ids);

        assert_eq!(field("hello").unwrap().id, "world");
        assert_eq!(field("n").unwrap().id, "42");
        assert_eq!(field("user.id").unwrap().id, "u1");
        assert!(matches!(field("gone"), Err(Error::MissingIdField(p)) if p == "gone"));
        assert!(matches!(field("nope"), Err(Error::MissingIdField(_))));
        assert_eq!(db.len(), 3);
    }

    #[test]
    fn test_store_reports_replacement() {
        let db = Database::new("db", Box::new(MemStorage::new()));
        let ids = IdGenerator::new(IdConfig::default());
        let source = IdentitySource::Path("k".to_string());

        assert!(!store(&source, &db, Document::new(), &ids).unwrap().replaced);
        assert!(store(&source, &db, Document::new(), &ids).unwrap().replaced);
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_store_generated_and_absent() {
        let db = Database::new("db", Box::new(MemStorage::new()));
        let ids = IdGenerator::new(IdConfig::default());

        let timed = store(&IdentitySource::TimeOrdered, &db, Document::new(), &ids).unwrap();
        assert_eq!(timed.id, "doc_1");
        let random = store(&IdentitySource::Random, &db, Document::new(), &ids).unwrap();
        assert_eq!(random.id.len(), 16);
        assert!(db.contains(&random.id));

        assert!(matches!(
            store(&IdentitySource::Absent, &db, Document::new(), &ids),
            Err(Error::MissingId)
        ));
        assert_eq!(db.len(), 2);
    }
}
