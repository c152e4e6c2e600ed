use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::filter::{Filter, FilterOrder};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// GET /api/users - paginated listing
pub async fn users_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let users = state
        .users
        .find_paginated(
            &Filter::empty(),
            FilterOrder::empty(),
            query.limit,
            query.skip,
        )
        .await?;
    Ok(Json(Value::Array(users)))
}
