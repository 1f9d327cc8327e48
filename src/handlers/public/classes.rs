use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::database::collections;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ClassService;
use crate::state::AppState;

const POPULAR_LIMIT: i64 = 6;

/// GET /classes and GET /approved-classes - the public catalogue
pub async fn approved(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let filter = Filter::matching(json!({ "status": "approved" }))?;
    let classes = state.store.find(collections::CLASSES, &filter).await?;
    Ok(ApiResponse::success(classes))
}

/// GET /classes-manage - every class regardless of status
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let classes = state.store.find(collections::CLASSES, &Filter::new()).await?;
    Ok(ApiResponse::success(classes))
}

/// GET /class/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let filter = Filter::matching(json!({ "_id": id }))?;
    let class = state
        .store
        .find_one(collections::CLASSES, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("Class not found"))?;
    Ok(ApiResponse::success(class))
}

/// GET /popular_classes
pub async fn popular(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let classes = ClassService::new(state.store.clone()).popular_classes(POPULAR_LIMIT).await?;
    Ok(ApiResponse::success(classes))
}
