use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::middleware::AuthUser;

/// GET /api/auth/whoami - echo the identity attached by the guard
pub async fn whoami_get(Extension(user): Extension<AuthUser>) -> Json<Value> {
    Json(json!({
        "id": user.id,
        "email": user.email,
        "firstName": user.first_name,
        "lastName": user.last_name,
        "gender": user.gender,
        "height": user.height,
    }))
}
