use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::filter::filter_where::{json_cmp, resolve_path};
use crate::filter::{Filter, FilterOrderInfo, SortDirection};

use super::store::{
    merge_system_fields, project_fields, validate_collection_name, CollectionSpec, DocumentStore,
    FindOptions, StoreError, UniqueIndex, UpdateManyResult,
};
use super::update::UpdateDocument;

/// In-memory `DocumentStore`, used by the test suites.
///
/// Collections spring into existence on first use, documents keep insertion
/// order (which doubles as creation order), and unique indexes declared via
/// `ensure_collection` are enforced on insert and update. Behavior is meant
/// to be indistinguishable from the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

#[derive(Default)]
struct MemoryCollection {
    unique: Vec<UniqueIndex>,
    docs: Vec<MemoryDoc>,
}

#[derive(Clone)]
struct MemoryDoc {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    doc: Value,
}

impl MemoryDoc {
    fn merged(&self) -> Value {
        merge_system_fields(self.id, self.created_at, self.updated_at, self.doc.clone())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), StoreError> {
        validate_collection_name(spec.name)?;
        let mut collections = self.collections.write().await;
        let collection = collections.entry(spec.name.to_string()).or_default();
        collection.unique = spec.unique.clone();
        Ok(())
    }

    async fn insert(&self, collection: &str, doc: Value) -> Result<Value, StoreError> {
        if !doc.is_object() {
            return Err(StoreError::InvalidDocument);
        }
        let mut collections = self.collections.write().await;
        let collection = collections.entry(collection.to_string()).or_default();
        check_unique(&collection.unique, &collection.docs, &doc, None)?;
        let now = Utc::now();
        let stored = MemoryDoc {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            doc,
        };
        let merged = stored.merged();
        collection.docs.push(stored);
        Ok(merged)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(collection) else {
            return Ok(vec![]);
        };
        let mut matches: Vec<&MemoryDoc> = collection
            .docs
            .iter()
            .filter(|d| filter.matches(&d.doc))
            .collect();
        let orders = options.sort.orders();
        if !orders.is_empty() {
            matches.sort_by(|a, b| compare_docs(a, b, orders));
        }
        let skip = options.skip.unwrap_or(0).max(0) as usize;
        let docs = matches.into_iter().skip(skip);
        let docs: Vec<Value> = match options.limit {
            Some(limit) => docs.take(limit.max(0) as usize).map(MemoryDoc::merged).collect(),
            None => docs.map(MemoryDoc::merged).collect(),
        };
        Ok(docs)
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.docs.iter().find(|d| d.id == id))
            .map(MemoryDoc::merged))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        select: Option<&[String]>,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        let found = collections
            .get(collection)
            .and_then(|c| c.docs.iter().find(|d| filter.matches(&d.doc)))
            .map(MemoryDoc::merged);
        Ok(match (found, select) {
            (Some(doc), Some(select)) => Some(project_fields(doc, select)),
            (found, _) => found,
        })
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        update: &UpdateDocument,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = collection.docs.iter().position(|d| d.id == id) else {
            return Ok(None);
        };
        apply_update(collection, pos, update).map(Some)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDocument,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = collection.docs.iter().position(|d| filter.matches(&d.doc)) else {
            return Ok(None);
        };
        apply_update(collection, pos, update).map(Some)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDocument,
    ) -> Result<UpdateManyResult, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(collection) else {
            return Ok(UpdateManyResult {
                matched: 0,
                modified: 0,
            });
        };
        let positions: Vec<usize> = collection
            .docs
            .iter()
            .enumerate()
            .filter(|(_, d)| filter.matches(&d.doc))
            .map(|(i, _)| i)
            .collect();
        let mut modified = 0;
        for pos in &positions {
            let before = collection.docs[*pos].doc.clone();
            apply_update(collection, *pos, update)?;
            if collection.docs[*pos].doc != before {
                modified += 1;
            }
        }
        Ok(UpdateManyResult {
            matched: positions.len() as u64,
            modified,
        })
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = collection.docs.iter().position(|d| d.id == id) else {
            return Ok(None);
        };
        Ok(Some(collection.docs.remove(pos).merged()))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = collection.docs.len();
        collection.docs.retain(|d| !filter.matches(&d.doc));
        Ok((before - collection.docs.len()) as u64)
    }
}

/// Apply in three steps: mutate a copy, re-check unique indexes against the
/// other documents, then commit with a fresh `updated_at`.
fn apply_update(
    collection: &mut MemoryCollection,
    pos: usize,
    update: &UpdateDocument,
) -> Result<Value, StoreError> {
    let mut next = collection.docs[pos].doc.clone();
    update.apply(&mut next);
    check_unique(&collection.unique, &collection.docs, &next, Some(pos))?;
    let doc = &mut collection.docs[pos];
    doc.doc = next;
    doc.updated_at = Utc::now();
    Ok(doc.merged())
}

fn check_unique(
    unique: &[UniqueIndex],
    docs: &[MemoryDoc],
    candidate: &Value,
    skip_pos: Option<usize>,
) -> Result<(), StoreError> {
    for index in unique {
        let Some(candidate_key) = unique_key(candidate, index) else {
            continue;
        };
        for (pos, existing) in docs.iter().enumerate() {
            if Some(pos) == skip_pos {
                continue;
            }
            if unique_key(&existing.doc, index).as_ref() == Some(&candidate_key) {
                return Err(StoreError::UniqueViolation {
                    field: index.field.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn unique_key(doc: &Value, index: &UniqueIndex) -> Option<String> {
    match doc.get(index.field)? {
        Value::Null => None,
        Value::String(s) if index.case_insensitive => Some(s.to_lowercase()),
        other => Some(other.to_string()),
    }
}

fn compare_docs(a: &MemoryDoc, b: &MemoryDoc, orders: &[FilterOrderInfo]) -> Ordering {
    for info in orders {
        let ord = match info.field.as_str() {
            "id" => a.id.cmp(&b.id),
            "createdAt" => a.created_at.cmp(&b.created_at),
            "updatedAt" => a.updated_at.cmp(&b.updated_at),
            _ => {
                let path: Vec<String> = info.field.split('.').map(str::to_string).collect();
                compare_doc_values(resolve_path(&a.doc, &path), resolve_path(&b.doc, &path))
            }
        };
        let ord = match info.sort {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Missing values sort last ascending, mirroring Postgres NULLS LAST.
fn compare_doc_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => json_cmp(a, b).unwrap_or(Ordering::Equal),
    }
}
