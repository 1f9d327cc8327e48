use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};

use super::auth::AuthUser;
use crate::database::{collections, models::Role};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::state::AppState;

/// User document loaded by a role guard
#[derive(Clone, Debug)]
pub struct ValidatedUser {
    pub email: String,
    pub document: Value,
}

pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    ensure_role(&state, Role::Admin, request, next).await
}

pub async fn require_instructor(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    ensure_role(&state, Role::Instructor, request, next).await
}

/// Loads the caller's user document and lets the request through only when its
/// role equals `role`. Must run after `jwt_auth_middleware`.
pub async fn ensure_role(state: &AppState, role: Role, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before role validation"))?;

    let filter = Filter::matching(json!({ "email": auth_user.email }))?;
    let user = state
        .store
        .find_one(collections::USERS, &filter)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Role check failed: no user document for {}", auth_user.email);
            ApiError::forbidden("Forbidden access")
        })?;

    match Role::of(&user) {
        Some(found) if found == role => {
            tracing::debug!("{} passed {} check", auth_user.email, role);
            request.extensions_mut().insert(ValidatedUser {
                email: auth_user.email,
                document: user,
            });
            Ok(next.run(request).await)
        }
        found => {
            tracing::warn!(
                "Role check failed: {} has role {:?}, {} required",
                auth_user.email,
                found.map(|r| r.as_str()),
                role
            );
            Err(ApiError::forbidden(format!("Forbidden access: {} role required", role)))
        }
    }
}
