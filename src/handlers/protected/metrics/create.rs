use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::body_composition::{bmi, body_fat_percentage, lean_body_mass, BodyFatInput};
use crate::AppState;

/// POST /api/metrics - record a measurement snapshot for the current user
///
/// The owner and the derived values (bmi, bodyFatPercentage, muscleMass)
/// are always computed server-side from the token identity and the raw
/// measurements; anything the client sent for them is overwritten.
pub async fn metrics_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(mut payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if let Value::Object(map) = &mut payload {
        map.insert("userId".to_string(), Value::String(user.id.to_string()));
        derive_composition(map, &user);
    }

    let metrics = state.metrics.create(payload).await?;
    Ok((StatusCode::CREATED, Json(metrics)))
}

/// Computes the derived fields when every raw input is present and
/// numeric. When one is missing the payload is left alone; validation
/// inside the create pipeline reports the missing field.
fn derive_composition(map: &mut Map<String, Value>, user: &AuthUser) {
    let inputs = (
        number(map, "weight"),
        number(map, "waistCircumference"),
        pair_first(map, "wristsCircumference"),
        number(map, "hipCircumference"),
        pair_first(map, "forearmsCircumference"),
    );
    let (Some(weight), Some(waist), Some(wrist), Some(hip), Some(forearm)) = inputs else {
        return;
    };

    let height_m = user.height as f64 / 100.0;
    let body_fat = body_fat_percentage(
        user.gender,
        BodyFatInput {
            weight,
            waist,
            wrist,
            hip,
            forearm,
        },
    );

    map.insert("bmi".to_string(), json!(bmi(weight, height_m)));
    map.insert("bodyFatPercentage".to_string(), json!(body_fat));
    map.insert(
        "muscleMass".to_string(),
        json!(lean_body_mass(weight, body_fat)),
    );
}

fn number(map: &Map<String, Value>, field: &str) -> Option<f64> {
    map.get(field).and_then(Value::as_f64)
}

/// Left-side measurement of a `[left, right]` pair; the formulas use the
/// first element only.
fn pair_first(map: &Map<String, Value>, field: &str) -> Option<f64> {
    map.get(field)?.as_array()?.first()?.as_f64()
}
