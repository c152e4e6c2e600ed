use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::AppState;

/// GET /api/users/:id - single user by id
pub async fn user_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.find_by_id(&id).await?;
    Ok(Json(user))
}
