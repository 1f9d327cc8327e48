use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::database::{collections, models::{NewUser, Role}, DatabaseError, InsertOneResult};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /new-user - sign up. Emails listed in the bootstrap admins config
/// become admins; everyone else starts as a plain user.
pub async fn post(State(state): State<AppState>, ApiJson(payload): ApiJson<NewUser>) -> ApiResult<InsertOneResult> {
    let role = if state.config.is_bootstrap_admin(&payload.email) { Role::Admin } else { Role::User };
    let document = payload.into_document(role)?;

    // Emails are a unique key of the users collection, so the store rejects the race
    let result = state
        .store
        .insert_one(collections::USERS, document)
        .await
        .map_err(|err| match err {
            DatabaseError::Duplicate(_) => ApiError::conflict("User already exists"),
            other => other.into(),
        })?;
    tracing::info!("Registered user {} as {}", result.inserted_id, role);
    Ok(ApiResponse::created(result))
}

/// GET /users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let users = state.store.find(collections::USERS, &Filter::new()).await?;
    Ok(ApiResponse::success(users))
}

/// GET /users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let filter = Filter::matching(json!({ "_id": id }))?;
    let user = state
        .store
        .find_one(collections::USERS, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(user))
}
