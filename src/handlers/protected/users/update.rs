use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::services::users_service::hash_password;
use crate::AppState;

/// PATCH /api/users/:id - partial profile update
///
/// The id and email are immutable through this route. An incoming password
/// is re-hashed so the stored value is never plaintext.
pub async fn user_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if payload.get("id").is_some() || payload.get("email").is_some() {
        return Err(ApiError::bad_request("You cannot update the id or email"));
    }

    if let Some(raw) = payload.get("password").and_then(Value::as_str) {
        let hash =
            hash_password(raw).map_err(|e| ApiError::conflict("Error updating record", e))?;
        payload["password"] = Value::String(hash);
    }

    let user = state.users.update(&id, payload, true).await?;
    Ok(Json(user))
}
