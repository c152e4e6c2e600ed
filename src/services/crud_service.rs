use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::database::{DocumentStore, FindOptions, UpdateDocument, UpdateManyResult};
use crate::error::ApiError;
use crate::filter::{Filter, FilterOrder};

/// Cap applied by `find_paginated` when the caller does not pass a limit.
pub const DEFAULT_FIND_LIMIT: i64 = 400;

/// Which operation a payload is being validated for, so one validator can
/// branch per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedAction {
    Create,
    FindOneAndUpdate,
    Update,
    UpdateOne,
}

#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub action: ValidatedAction,
    pub entity_id: Option<Uuid>,
}

impl ValidationContext {
    pub fn new(action: ValidatedAction) -> Self {
        Self {
            action,
            entity_id: None,
        }
    }

    pub fn with_entity_id(action: ValidatedAction, entity_id: Uuid) -> Self {
        Self {
            action,
            entity_id: Some(entity_id),
        }
    }
}

/// Per-entity extension points of the CRUD engine.
///
/// `map_entity_to_dto` is the one mandatory hook: it projects a stored
/// record onto the outward shape and is the only place fields can be
/// withheld from responses. Everything else defaults to identity / no-op.
/// Errors returned from hooks pass through the engine untouched; only
/// store failures get collapsed into `Conflict`.
#[async_trait]
pub trait EntityHooks: Send + Sync + 'static {
    /// Used in "<EntityName> not found" messages.
    fn entity_name(&self) -> &'static str;

    fn collection(&self) -> &'static str;

    fn map_entity_to_dto(&self, record: Value) -> Value;

    fn map_dto_to_entity(&self, dto: Value) -> Value {
        dto
    }

    async fn validate(&self, _payload: &Value, _ctx: &ValidationContext) -> Result<(), ApiError> {
        Ok(())
    }

    async fn after_create(&self, record: Value) -> Result<Value, ApiError> {
        Ok(record)
    }

    async fn after_update(&self, record: Value) -> Result<Value, ApiError> {
        Ok(record)
    }
}

/// Generic CRUD engine over a document store.
///
/// Every operation runs the same shaped pipeline: validate (mutations
/// only) → map inward → store → after-hook → map outward. Ids are checked
/// before any store access, mutating operations raise `NotFound` when
/// nothing matched, and unexpected store errors come back as `Conflict`
/// with a per-operation context message.
pub struct CrudService<H: EntityHooks> {
    store: Arc<dyn DocumentStore>,
    hooks: H,
}

impl<H: EntityHooks> CrudService<H> {
    pub fn new(store: Arc<dyn DocumentStore>, hooks: H) -> Self {
        Self { store, hooks }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Raw store handle, for entity services that need to step around DTO
    /// mapping (credential lookups).
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn create(&self, dto: Value) -> Result<Value, ApiError> {
        self.hooks
            .validate(&dto, &ValidationContext::new(ValidatedAction::Create))
            .await?;
        let entity = self.hooks.map_dto_to_entity(dto);
        let record = self
            .store
            .insert(self.hooks.collection(), entity)
            .await
            .map_err(|e| ApiError::conflict("Error creating record", e))?;
        let record = self.hooks.after_create(record).await?;
        Ok(self.hooks.map_entity_to_dto(record))
    }

    pub async fn find(&self, filter: &Filter) -> Result<Vec<Value>, ApiError> {
        let records = self
            .store
            .find(self.hooks.collection(), filter, &FindOptions::default())
            .await
            .map_err(|e| ApiError::conflict("Error finding records", e))?;
        Ok(records
            .into_iter()
            .map(|r| self.hooks.map_entity_to_dto(r))
            .collect())
    }

    pub async fn find_paginated(
        &self,
        filter: &Filter,
        sort: FilterOrder,
        limit: Option<i64>,
        skip: Option<i64>,
    ) -> Result<Vec<Value>, ApiError> {
        let options = FindOptions {
            sort,
            limit: Some(limit.unwrap_or(DEFAULT_FIND_LIMIT)),
            skip: Some(skip.unwrap_or(0)),
        };
        let records = self
            .store
            .find(self.hooks.collection(), filter, &options)
            .await
            .map_err(|e| ApiError::conflict("Error finding records", e))?;
        Ok(records
            .into_iter()
            .map(|r| self.hooks.map_entity_to_dto(r))
            .collect())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Value, ApiError> {
        let id = self.parse_id(id)?;
        let record = self
            .store
            .find_by_id(self.hooks.collection(), id)
            .await
            .map_err(|e| ApiError::conflict("Error finding record", e))?
            .ok_or_else(|| self.not_found())?;
        Ok(self.hooks.map_entity_to_dto(record))
    }

    pub async fn find_one(
        &self,
        filter: &Filter,
        select: Option<&[String]>,
    ) -> Result<Value, ApiError> {
        let record = self
            .store
            .find_one(self.hooks.collection(), filter, select)
            .await
            .map_err(|e| ApiError::conflict("Error finding record", e))?
            .ok_or_else(|| self.not_found())?;
        Ok(self.hooks.map_entity_to_dto(record))
    }

    /// Filter-addressed partial update on the narrow path: no inward
    /// mapping and no after-update hook, just validate → flatten → store.
    pub async fn find_one_and_update(&self, filter: &Filter, dto: Value) -> Result<Value, ApiError> {
        self.hooks
            .validate(&dto, &ValidationContext::new(ValidatedAction::FindOneAndUpdate))
            .await?;
        let update = UpdateDocument::from_payload(&dto, true);
        let record = self
            .store
            .update_one(self.hooks.collection(), filter, &update)
            .await
            .map_err(|e| ApiError::conflict("Error updating record", e))?
            .ok_or_else(|| self.not_found())?;
        Ok(self.hooks.map_entity_to_dto(record))
    }

    pub async fn update(&self, id: &str, dto: Value, dot_notation: bool) -> Result<Value, ApiError> {
        let id = self.parse_id(id)?;
        self.hooks
            .validate(
                &dto,
                &ValidationContext::with_entity_id(ValidatedAction::Update, id),
            )
            .await?;
        let entity = self.hooks.map_dto_to_entity(dto);
        let update = UpdateDocument::from_payload(&entity, dot_notation);
        let record = self
            .store
            .update_by_id(self.hooks.collection(), id, &update)
            .await
            .map_err(|e| ApiError::conflict("Error updating record", e))?;
        let record = match record {
            Some(record) => self.hooks.after_update(record).await?,
            None => return Err(self.not_found()),
        };
        Ok(self.hooks.map_entity_to_dto(record))
    }

    pub async fn update_one(
        &self,
        filter: &Filter,
        dto: Value,
        dot_notation: bool,
    ) -> Result<Value, ApiError> {
        self.hooks
            .validate(&dto, &ValidationContext::new(ValidatedAction::UpdateOne))
            .await?;
        let entity = self.hooks.map_dto_to_entity(dto);
        let update = UpdateDocument::from_payload(&entity, dot_notation);
        let record = self
            .store
            .update_one(self.hooks.collection(), filter, &update)
            .await
            .map_err(|e| ApiError::conflict("Error updating record", e))?;
        let record = match record {
            Some(record) => self.hooks.after_update(record).await?,
            None => return Err(self.not_found()),
        };
        Ok(self.hooks.map_entity_to_dto(record))
    }

    pub async fn remove(&self, id: &str) -> Result<Value, ApiError> {
        let id = self.parse_id(id)?;
        let record = self
            .store
            .delete_by_id(self.hooks.collection(), id)
            .await
            .map_err(|e| ApiError::conflict("Error deleting record", e))?
            .ok_or_else(|| self.not_found())?;
        Ok(self.hooks.map_entity_to_dto(record))
    }

    /// Bulk update: flattened always, no validation, no DTO mapping. The
    /// raw store counts go back to the caller.
    pub async fn update_many(
        &self,
        filter: &Filter,
        payload: Value,
    ) -> Result<UpdateManyResult, ApiError> {
        let update = UpdateDocument::from_payload(&payload, true);
        self.store
            .update_many(self.hooks.collection(), filter, &update)
            .await
            .map_err(|e| ApiError::conflict("Error updating records", e))
    }

    pub async fn delete_many(&self, filter: &Filter) -> Result<(), ApiError> {
        self.store
            .delete_many(self.hooks.collection(), filter)
            .await
            .map_err(|e| ApiError::conflict("Error deleting records", e))?;
        Ok(())
    }

    fn parse_id(&self, id: &str) -> Result<Uuid, ApiError> {
        Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Record id is not valid"))
    }

    fn not_found(&self) -> ApiError {
        ApiError::not_found(format!("{} not found", self.hooks.entity_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{CollectionSpec, MemoryStore, StoreError};
    use crate::validation::FieldError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CallLog {
        validations: Vec<String>,
        dto_maps: usize,
        after_creates: usize,
        after_updates: usize,
    }

    /// Hooks for a fictional "widgets" entity: strips `secret` on the way
    /// out, rejects payloads containing `boom`, and records every call.
    struct WidgetHooks {
        log: Arc<Mutex<CallLog>>,
    }

    impl WidgetHooks {
        fn new() -> (Self, Arc<Mutex<CallLog>>) {
            let log = Arc::new(Mutex::new(CallLog::default()));
            (Self { log: log.clone() }, log)
        }
    }

    #[async_trait]
    impl EntityHooks for WidgetHooks {
        fn entity_name(&self) -> &'static str {
            "Widget"
        }

        fn collection(&self) -> &'static str {
            "widgets"
        }

        fn map_entity_to_dto(&self, mut record: Value) -> Value {
            if let Some(map) = record.as_object_mut() {
                map.remove("secret");
            }
            record
        }

        fn map_dto_to_entity(&self, dto: Value) -> Value {
            self.log.lock().unwrap().dto_maps += 1;
            dto
        }

        async fn validate(&self, payload: &Value, ctx: &ValidationContext) -> Result<(), ApiError> {
            self.log.lock().unwrap().validations.push(format!(
                "{:?}:{}",
                ctx.action,
                ctx.entity_id.is_some()
            ));
            if payload.get("boom").is_some() {
                return Err(ApiError::validation(vec![FieldError {
                    field: "boom".to_string(),
                    message: "boom must not be present".to_string(),
                }]));
            }
            Ok(())
        }

        async fn after_create(&self, record: Value) -> Result<Value, ApiError> {
            self.log.lock().unwrap().after_creates += 1;
            Ok(record)
        }

        async fn after_update(&self, record: Value) -> Result<Value, ApiError> {
            self.log.lock().unwrap().after_updates += 1;
            Ok(record)
        }
    }

    /// Store wrapper counting every operation, to prove pre-flight checks
    /// reject before any store access.
    struct CountingStore {
        inner: MemoryStore,
        ops: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                ops: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.ops.load(Ordering::SeqCst)
        }

        fn tick(&self) {
            self.ops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), StoreError> {
            self.tick();
            self.inner.ensure_collection(spec).await
        }

        async fn insert(&self, collection: &str, doc: Value) -> Result<Value, StoreError> {
            self.tick();
            self.inner.insert(collection, doc).await
        }

        async fn find(
            &self,
            collection: &str,
            filter: &Filter,
            options: &FindOptions,
        ) -> Result<Vec<Value>, StoreError> {
            self.tick();
            self.inner.find(collection, filter, options).await
        }

        async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
            self.tick();
            self.inner.find_by_id(collection, id).await
        }

        async fn find_one(
            &self,
            collection: &str,
            filter: &Filter,
            select: Option<&[String]>,
        ) -> Result<Option<Value>, StoreError> {
            self.tick();
            self.inner.find_one(collection, filter, select).await
        }

        async fn update_by_id(
            &self,
            collection: &str,
            id: Uuid,
            update: &UpdateDocument,
        ) -> Result<Option<Value>, StoreError> {
            self.tick();
            self.inner.update_by_id(collection, id, update).await
        }

        async fn update_one(
            &self,
            collection: &str,
            filter: &Filter,
            update: &UpdateDocument,
        ) -> Result<Option<Value>, StoreError> {
            self.tick();
            self.inner.update_one(collection, filter, update).await
        }

        async fn update_many(
            &self,
            collection: &str,
            filter: &Filter,
            update: &UpdateDocument,
        ) -> Result<UpdateManyResult, StoreError> {
            self.tick();
            self.inner.update_many(collection, filter, update).await
        }

        async fn delete_by_id(
            &self,
            collection: &str,
            id: Uuid,
        ) -> Result<Option<Value>, StoreError> {
            self.tick();
            self.inner.delete_by_id(collection, id).await
        }

        async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
            self.tick();
            self.inner.delete_many(collection, filter).await
        }
    }

    /// Store whose every operation fails, for conflict-wrapping tests.
    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn ensure_collection(&self, _spec: &CollectionSpec) -> Result<(), StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn insert(&self, _collection: &str, _doc: Value) -> Result<Value, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn find(
            &self,
            _collection: &str,
            _filter: &Filter,
            _options: &FindOptions,
        ) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn find_by_id(
            &self,
            _collection: &str,
            _id: Uuid,
        ) -> Result<Option<Value>, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn find_one(
            &self,
            _collection: &str,
            _filter: &Filter,
            _select: Option<&[String]>,
        ) -> Result<Option<Value>, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn update_by_id(
            &self,
            _collection: &str,
            _id: Uuid,
            _update: &UpdateDocument,
        ) -> Result<Option<Value>, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn update_one(
            &self,
            _collection: &str,
            _filter: &Filter,
            _update: &UpdateDocument,
        ) -> Result<Option<Value>, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn update_many(
            &self,
            _collection: &str,
            _filter: &Filter,
            _update: &UpdateDocument,
        ) -> Result<UpdateManyResult, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn delete_by_id(
            &self,
            _collection: &str,
            _id: Uuid,
        ) -> Result<Option<Value>, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }

        async fn delete_many(&self, _collection: &str, _filter: &Filter) -> Result<u64, StoreError> {
            Err(StoreError::InvalidCollection("broken".to_string()))
        }
    }

    fn widget_service() -> (CrudService<WidgetHooks>, Arc<Mutex<CallLog>>) {
        let (hooks, log) = WidgetHooks::new();
        (CrudService::new(Arc::new(MemoryStore::new()), hooks), log)
    }

    #[tokio::test]
    async fn test_create_runs_full_pipeline() {
        let (service, log) = widget_service();
        let dto = service
            .create(json!({"name": "gear", "secret": "s"}))
            .await
            .unwrap();
        assert_eq!(dto["name"], json!("gear"));
        assert!(dto.get("secret").is_none());
        assert!(dto["id"].is_string());
        let log = log.lock().unwrap();
        assert_eq!(log.validations, vec!["Create:false"]);
        assert_eq!(log.dto_maps, 1);
        assert_eq!(log.after_creates, 1);
    }

    #[tokio::test]
    async fn test_create_then_find_by_id_round_trips() {
        let (service, _) = widget_service();
        let created = service
            .create(json!({"name": "gear", "size": {"w": 1, "h": 2}, "tags": ["a", "b"]}))
            .await
            .unwrap();
        let found = service
            .find_by_id(created["id"].as_str().unwrap())
            .await
            .unwrap();
        assert_eq!(found, created);
        assert_eq!(found["size"], json!({"w": 1, "h": 2}));
        assert_eq!(found["tags"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_validation_failure_short_circuits_store() {
        let store = Arc::new(CountingStore::new());
        let (hooks, _) = WidgetHooks::new();
        let service = CrudService::new(store.clone(), hooks);
        let err = service.create(json!({"boom": 1})).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_id_rejected_before_store_and_validation() {
        let store = Arc::new(CountingStore::new());
        let (hooks, log) = WidgetHooks::new();
        let service = CrudService::new(store.clone(), hooks);

        let err = service.update("not-a-uuid", json!({"name": "x"}), true).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Record id is not valid"));
        let err = service.find_by_id("123").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        let err = service.remove("").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        assert_eq!(store.count(), 0);
        assert!(log.lock().unwrap().validations.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_returns_post_image() {
        let (service, log) = widget_service();
        let created = service
            .create(json!({"name": "gear", "size": {"w": 1, "h": 2}}))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let updated = service
            .update(id, json!({"size": {"w": 9}}), true)
            .await
            .unwrap();
        assert_eq!(updated["size"], json!({"w": 9, "h": 2}));
        assert_eq!(updated["name"], json!("gear"));

        let log = log.lock().unwrap();
        assert_eq!(log.after_updates, 1);
        assert!(log.validations.contains(&"Update:true".to_string()));
    }

    #[tokio::test]
    async fn test_update_without_dot_notation_replaces_wholesale() {
        let (service, _) = widget_service();
        let created = service
            .create(json!({"name": "gear", "size": {"w": 1, "h": 2}}))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();
        let updated = service
            .update(id, json!({"size": {"w": 9}}), false)
            .await
            .unwrap();
        assert_eq!(updated["size"], json!({"w": 9}));
    }

    #[tokio::test]
    async fn test_remove_returns_pre_image_then_not_found() {
        let (service, _) = widget_service();
        let created = service.create(json!({"name": "gear"})).await.unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let removed = service.remove(&id).await.unwrap();
        assert_eq!(removed["name"], json!("gear"));

        let err = service.remove(&id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Widget not found"));
    }

    #[tokio::test]
    async fn test_missing_records_surface_entity_name() {
        let (service, _) = widget_service();
        let ghost = Uuid::new_v4().to_string();
        let err = service.find_by_id(&ghost).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Widget not found"));

        let err = service
            .update(&ghost, json!({"name": "x"}), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_returns_empty_list() {
        let (service, _) = widget_service();
        let found = service.find(&Filter::empty()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_one_absent_is_not_found() {
        let (service, _) = widget_service();
        let filter = Filter::where_eq("name", json!("ghost")).unwrap();
        let err = service.find_one(&filter, None).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Widget not found"));
    }

    #[tokio::test]
    async fn test_find_one_projection_narrows_the_dto() {
        let (service, _) = widget_service();
        service
            .create(json!({"name": "gear", "size": {"w": 1}, "n": 7}))
            .await
            .unwrap();
        let filter = Filter::where_eq("name", json!("gear")).unwrap();
        let select = vec!["name".to_string()];
        let found = service.find_one(&filter, Some(&select)).await.unwrap();
        assert_eq!(found["name"], json!("gear"));
        assert!(found.get("n").is_none());
        assert!(found["id"].is_string());
    }

    #[tokio::test]
    async fn test_find_paginated_windows_and_sorts() {
        let (service, _) = widget_service();
        for n in [3, 1, 2] {
            service.create(json!({"name": "w", "n": n})).await.unwrap();
        }
        let sort = FilterOrder::parse(&json!({"n": 1})).unwrap();
        let page = service
            .find_paginated(&Filter::empty(), sort, Some(2), Some(1))
            .await
            .unwrap();
        let ns: Vec<_> = page.iter().map(|d| d["n"].clone()).collect();
        assert_eq!(ns, vec![json!(2), json!(3)]);

        // Defaults: skip 0, limit high enough to return everything here.
        let all = service
            .find_paginated(&Filter::empty(), FilterOrder::empty(), None, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(DEFAULT_FIND_LIMIT, 400);
    }

    #[tokio::test]
    async fn test_find_one_and_update_skips_entity_hooks() {
        let (service, log) = widget_service();
        service.create(json!({"name": "gear", "n": 1})).await.unwrap();

        let updated = service
            .find_one_and_update(&Filter::where_eq("name", json!("gear")).unwrap(), json!({"n": 2}))
            .await
            .unwrap();
        assert_eq!(updated["n"], json!(2));

        let log = log.lock().unwrap();
        assert!(log.validations.contains(&"FindOneAndUpdate:false".to_string()));
        assert_eq!(log.after_updates, 0);
        // One inward mapping from create, none from find_one_and_update.
        assert_eq!(log.dto_maps, 1);
    }

    #[tokio::test]
    async fn test_update_many_skips_validation_and_reports_counts() {
        let (service, log) = widget_service();
        service.create(json!({"name": "a", "tag": "x"})).await.unwrap();
        service.create(json!({"name": "b", "tag": "x"})).await.unwrap();
        service.create(json!({"name": "c", "tag": "y"})).await.unwrap();
        log.lock().unwrap().validations.clear();

        let result = service
            .update_many(&Filter::where_eq("tag", json!("x")).unwrap(), json!({"tag": "z"}))
            .await
            .unwrap();
        assert_eq!(result.matched, 2);
        assert_eq!(result.modified, 2);
        assert!(log.lock().unwrap().validations.is_empty());
    }

    #[tokio::test]
    async fn test_delete_many_is_silent() {
        let (service, _) = widget_service();
        service.create(json!({"name": "a"})).await.unwrap();
        service.create(json!({"name": "b"})).await.unwrap();
        service.delete_many(&Filter::empty()).await.unwrap();
        assert!(service.find(&Filter::empty()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_collapse_to_conflict_with_context() {
        let (hooks, _) = WidgetHooks::new();
        let service = CrudService::new(Arc::new(BrokenStore), hooks);

        let err = service.create(json!({"name": "x"})).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict { ref message, .. } if message == "Error creating record"));

        let err = service.find(&Filter::empty()).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict { ref message, .. } if message == "Error finding records"));

        let err = service.delete_many(&Filter::empty()).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict { ref message, .. } if message == "Error deleting records"));
    }

    #[tokio::test]
    async fn test_unique_violation_becomes_conflict() {
        let store = Arc::new(MemoryStore::new());
        store
            .ensure_collection(&CollectionSpec::new("widgets").unique_ci("name"))
            .await
            .unwrap();
        let (hooks, _) = WidgetHooks::new();
        let service = CrudService::new(store, hooks);

        service.create(json!({"name": "gear"})).await.unwrap();
        let err = service.create(json!({"name": "Gear"})).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict { ref message, .. } if message == "Error creating record"));
    }
}
