use axum::extract::{Path, State};
use serde_json::json;

use crate::database::{
    collections,
    document::parse_id,
    models::{StatusChange, UserUpdate},
    DeleteResult, Update, UpdateOptions, UpdateResult,
};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::{AdminStats, ClassService};
use crate::state::AppState;

/// DELETE /delete-user/:id
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<DeleteResult> {
    let filter = Filter::matching(json!({ "_id": id }))?;
    let result = state.store.delete_one(collections::USERS, &filter).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::not_found("User not found"));
    }
    tracing::info!("Deleted user {}", id);
    Ok(ApiResponse::success(result))
}

/// PUT /update-user/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> ApiResult<UpdateResult> {
    if parse_id(&id).is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    let filter = Filter::matching(json!({ "_id": id }))?;
    let update = Update::set(payload.into_set()?)?;
    let result = state
        .store
        .update_one(collections::USERS, &filter, &update, UpdateOptions::upsert())
        .await?;
    Ok(ApiResponse::success(result))
}

/// PATCH /change-status/:id - approve or deny a class
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(change): ApiJson<StatusChange>,
) -> ApiResult<UpdateResult> {
    if parse_id(&id).is_none() {
        return Err(ApiError::not_found("Class not found"));
    }
    let filter = Filter::matching(json!({ "_id": id }))?;
    let status = change.status;
    let update = Update::set(change.into_set())?;
    let result = state
        .store
        .update_one(collections::CLASSES, &filter, &update, UpdateOptions::upsert())
        .await?;
    tracing::info!("Class {} is now {}", id, status.as_str());
    Ok(ApiResponse::success(result))
}

/// GET /admin-stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<AdminStats> {
    let stats = ClassService::new(state.store.clone()).admin_stats().await?;
    Ok(ApiResponse::success(stats))
}
