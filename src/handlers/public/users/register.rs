use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::error::ApiError;
use crate::AppState;

/// POST /api/users - register a new account
pub async fn user_register(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state.users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
