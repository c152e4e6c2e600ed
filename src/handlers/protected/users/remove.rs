use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::AppState;

/// DELETE /api/users/:id - delete an account, returning its final state
pub async fn user_remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.remove(&id).await?;
    Ok(Json(user))
}
