use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::{CollectionSpec, DocumentStore};
use crate::error::ApiError;
use crate::validation::{validate_payload, METRICS_CREATE, METRICS_UPDATE};

use super::crud_service::{CrudService, EntityHooks, ValidatedAction, ValidationContext};

// `updatedAt` is intentionally absent: a measurement snapshot exposes only
// its creation time.
const METRICS_DTO_FIELDS: &[&str] = &[
    "id",
    "userId",
    "weight",
    "armsCircumference",
    "forearmsCircumference",
    "wristsCircumference",
    "legsUpCircumference",
    "calfsCircumference",
    "waistCircumference",
    "hipCircumference",
    "bmi",
    "bodyFatPercentage",
    "muscleMass",
    "createdAt",
];

pub struct BodyMetricsHooks;

#[async_trait]
impl EntityHooks for BodyMetricsHooks {
    fn entity_name(&self) -> &'static str {
        "BodyMetrics"
    }

    fn collection(&self) -> &'static str {
        "body_metrics"
    }

    fn map_entity_to_dto(&self, record: Value) -> Value {
        let Value::Object(record) = record else {
            return record;
        };
        let mut dto = Map::new();
        for field in METRICS_DTO_FIELDS {
            if let Some(value) = record.get(*field) {
                dto.insert(field.to_string(), value.clone());
            }
        }
        Value::Object(dto)
    }

    async fn validate(&self, payload: &Value, ctx: &ValidationContext) -> Result<(), ApiError> {
        let rules = match ctx.action {
            ValidatedAction::Create => METRICS_CREATE,
            _ => METRICS_UPDATE,
        };
        validate_payload(payload, rules).map_err(ApiError::validation)
    }
}

pub type BodyMetricsService = CrudService<BodyMetricsHooks>;

impl CrudService<BodyMetricsHooks> {
    pub fn body_metrics(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, BodyMetricsHooks)
    }

    pub fn collection_spec() -> CollectionSpec {
        CollectionSpec::new("body_metrics")
    }
}
