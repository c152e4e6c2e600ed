use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::filter::{Filter, FilterError, FilterOrder};

use super::update::UpdateDocument;

/// Keys the store owns; they ride on real columns and are merged into every
/// returned document, shadowing any same-named field in the body.
pub const SYSTEM_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate value for unique field '{field}'")]
    UniqueViolation { field: String },

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Document must be a JSON object")]
    InvalidDocument,

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Declarative shape of a collection, applied at startup.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub unique: Vec<UniqueIndex>,
}

#[derive(Debug, Clone)]
pub struct UniqueIndex {
    pub field: &'static str,
    pub case_insensitive: bool,
}

impl CollectionSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            unique: vec![],
        }
    }

    pub fn unique_ci(mut self, field: &'static str) -> Self {
        self.unique.push(UniqueIndex {
            field,
            case_insensitive: true,
        });
        self
    }
}

/// Sort, window, and nothing else; projection belongs to `find_one`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: FilterOrder,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateManyResult {
    pub matched: u64,
    pub modified: u64,
}

/// Storage behind the CRUD engine.
///
/// Documents are schemaless JSON objects addressed by UUID. Filters and
/// updates speak the document language from `crate::filter` and
/// `crate::database::update`; every returned document carries the merged
/// system fields. The Postgres implementation backs production, the memory
/// implementation backs tests, and both must agree observably.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), StoreError>;

    async fn insert(&self, collection: &str, doc: Value) -> Result<Value, StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        select: Option<&[String]>,
    ) -> Result<Option<Value>, StoreError>;

    /// Post-image of the updated record, or None when the id is absent.
    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        update: &UpdateDocument,
    ) -> Result<Option<Value>, StoreError>;

    /// Update the oldest record matching the filter, returning its
    /// post-image.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDocument,
    ) -> Result<Option<Value>, StoreError>;

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDocument,
    ) -> Result<UpdateManyResult, StoreError>;

    /// Pre-image of the deleted record, or None when the id is absent.
    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;
}

/// Collection names are embedded in SQL as identifiers, so the alphabet is
/// closed.
pub(crate) fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

pub(crate) fn merge_system_fields(
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    doc: Value,
) -> Value {
    let mut map = match doc {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert("id".to_string(), Value::String(id.to_string()));
    map.insert(
        "createdAt".to_string(),
        Value::String(created_at.to_rfc3339()),
    );
    map.insert(
        "updatedAt".to_string(),
        Value::String(updated_at.to_rfc3339()),
    );
    Value::Object(map)
}

/// Keep only the selected fields; system fields always survive.
pub(crate) fn project_fields(doc: Value, select: &[String]) -> Value {
    let Value::Object(map) = doc else {
        return doc;
    };
    let kept = map
        .into_iter()
        .filter(|(key, _)| {
            SYSTEM_FIELDS.contains(&key.as_str()) || select.iter().any(|s| s == key)
        })
        .collect::<Map<_, _>>();
    Value::Object(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_name_alphabet() {
        assert!(validate_collection_name("body_metrics").is_ok());
        assert!(validate_collection_name("users").is_ok());
        assert!(validate_collection_name("Users").is_err());
        assert!(validate_collection_name("users; drop").is_err());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("9users").is_err());
    }

    #[test]
    fn test_system_fields_shadow_doc_fields() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let merged = merge_system_fields(id, now, now, json!({"id": "fake", "weight": 70}));
        assert_eq!(merged["id"], json!(id.to_string()));
        assert_eq!(merged["weight"], json!(70));
    }

    #[test]
    fn test_projection_keeps_system_fields() {
        let doc = json!({"id": "x", "createdAt": "t", "updatedAt": "t", "email": "a@b.c", "password": "h"});
        let projected = project_fields(doc, &["email".to_string()]);
        assert_eq!(
            projected,
            json!({"id": "x", "createdAt": "t", "updatedAt": "t", "email": "a@b.c"})
        );
    }
}
