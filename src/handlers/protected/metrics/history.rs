use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::filter::Filter;
use crate::AppState;

/// GET /api/metrics/:id - snapshot history for a user id
pub async fn metrics_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::where_eq("userId", Value::String(id))
        .map_err(|e| ApiError::conflict("Error finding records", e))?;
    let history = state.metrics.find(&filter).await?;
    Ok(Json(Value::Array(history)))
}
