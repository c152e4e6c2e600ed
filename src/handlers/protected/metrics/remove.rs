use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::AppState;

/// DELETE /api/metrics/:id - delete a snapshot, returning its final state
pub async fn metrics_remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let metrics = state.metrics.remove(&id).await?;
    Ok(Json(metrics))
}
