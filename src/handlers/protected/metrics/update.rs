use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::AppState;

/// PATCH /api/metrics/:id - partial snapshot update
///
/// The id and owning userId are immutable through this route. Measurement
/// pairs are replaced wholesale; derived values are not recomputed on update.
pub async fn metrics_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if payload.get("id").is_some() || payload.get("userId").is_some() {
        return Err(ApiError::bad_request("You cannot update the id or userId"));
    }

    let metrics = state.metrics.update(&id, payload, true).await?;
    Ok(Json(metrics))
}
