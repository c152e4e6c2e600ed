use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

/// PATCH /api/users/disable/:id - deactivate an account
pub async fn user_disable(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.update(&id, json!({ "status": false }), true).await?;
    Ok(Json(user))
}
