use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::AppState;

/// GET /api/metrics/detail/:id - single snapshot by record id
pub async fn metrics_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let metrics = state.metrics.find_by_id(&id).await?;
    Ok(Json(metrics))
}
