use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::database::{collections, models::InstructorApplication, InsertOneResult};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::{ClassService, PopularInstructor};
use crate::state::AppState;

const POPULAR_LIMIT: usize = 6;

/// GET /instructors
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let filter = Filter::matching(json!({ "role": "instructor" }))?;
    let instructors = state.store.find(collections::USERS, &filter).await?;
    Ok(ApiResponse::success(instructors))
}

/// GET /popular-instructors
pub async fn popular(State(state): State<AppState>) -> ApiResult<Vec<PopularInstructor>> {
    let ranked = ClassService::new(state.store.clone())
        .popular_instructors(POPULAR_LIMIT)
        .await?;
    Ok(ApiResponse::success(ranked))
}

/// POST /as-instructor - apply for the instructor role
pub async fn apply(
    State(state): State<AppState>,
    ApiJson(application): ApiJson<InstructorApplication>,
) -> ApiResult<InsertOneResult> {
    let document = application.into_document(&chrono::Utc::now().to_rfc3339())?;
    let result = state.store.insert_one(collections::APPLIED, document).await?;
    Ok(ApiResponse::created(result))
}

/// GET /applied-instructors/:email
pub async fn application(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Value> {
    let filter = Filter::matching(json!({ "email": email }))?;
    let application = state
        .store
        .find_one(collections::APPLIED, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("No application for this email"))?;
    Ok(ApiResponse::success(application))
}
