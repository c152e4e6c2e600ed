use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::{CollectionSpec, DocumentStore};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::validation::{validate_payload, USERS_CREATE, USERS_UPDATE};

use super::crud_service::{CrudService, EntityHooks, ValidatedAction, ValidationContext};

/// Work factor for stored password hashes.
pub const PASSWORD_COST: u32 = 10;

/// Outward user shape. `password` is not in this list and therefore can
/// never appear in a response, whatever the stored record contains.
const USER_DTO_FIELDS: &[&str] = &[
    "id",
    "firstName",
    "lastName",
    "email",
    "birthDay",
    "height",
    "gender",
    "status",
    "createdAt",
    "updatedAt",
];

pub struct UserHooks;

#[async_trait]
impl EntityHooks for UserHooks {
    fn entity_name(&self) -> &'static str {
        "User"
    }

    fn collection(&self) -> &'static str {
        "users"
    }

    fn map_entity_to_dto(&self, record: Value) -> Value {
        let Value::Object(record) = record else {
            return record;
        };
        let mut dto = Map::new();
        for field in USER_DTO_FIELDS {
            if let Some(value) = record.get(*field) {
                dto.insert(field.to_string(), value.clone());
            }
        }
        Value::Object(dto)
    }

    /// Emails are stored lowercased and trimmed; lookups normalize the
    /// same way.
    fn map_dto_to_entity(&self, mut dto: Value) -> Value {
        if let Some(email) = dto.get("email").and_then(Value::as_str) {
            let normalized = normalize_email(email);
            dto["email"] = Value::String(normalized);
        }
        dto
    }

    async fn validate(&self, payload: &Value, ctx: &ValidationContext) -> Result<(), ApiError> {
        let rules = match ctx.action {
            ValidatedAction::Create => USERS_CREATE,
            _ => USERS_UPDATE,
        };
        validate_payload(payload, rules).map_err(ApiError::validation)
    }
}

pub type UsersService = CrudService<UserHooks>;

impl CrudService<UserHooks> {
    pub fn users(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, UserHooks)
    }

    pub fn collection_spec() -> CollectionSpec {
        CollectionSpec::new("users").unique_ci("email")
    }

    /// Registration entry: hash the password, activate the account, then
    /// run the generic create pipeline. Passwords are hashed at rest, so
    /// the raw value never reaches the store.
    pub async fn register(&self, mut dto: Value) -> Result<Value, ApiError> {
        if let Some(raw) = dto.get("password").and_then(Value::as_str) {
            let hash = hash_password(raw)
                .map_err(|e| ApiError::conflict("Error creating record", e))?;
            dto["password"] = Value::String(hash);
        }
        if let Value::Object(map) = &mut dto {
            map.insert("status".to_string(), Value::Bool(true));
        }
        self.create(dto).await
    }

    /// Full stored record, password hash included, for the login flow.
    /// Bypasses DTO mapping on purpose; never expose the result.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<Value>, ApiError> {
        let filter = Filter::where_eq("email", Value::String(normalize_email(email)))
            .map_err(|e| ApiError::conflict("Error finding record", e))?;
        self.store()
            .find_one(self.hooks().collection(), &filter, None)
            .await
            .map_err(|e| ApiError::conflict("Error finding record", e))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(raw: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(raw, PASSWORD_COST)
}
