use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::database::collections;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /user/:email
pub async fn get(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Value> {
    let filter = Filter::matching(json!({ "email": email }))?;
    let user = state
        .store
        .find_one(collections::USERS, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(user))
}
