// handlers/public/token.rs - POST /api/set-token
use axum::extract::State;
use serde_json::{json, Map, Value};

use crate::auth::{generate_jwt, Claims};
use crate::database::models::{normalize_email, validate_email};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

/// Issues a bearer token for the given email. The caller's role is looked up
/// by the guards on every request, so the token carries only the email.
///
/// The body is the client's user object; only an object is accepted.
pub async fn post(State(state): State<AppState>, ApiJson(body): ApiJson<Map<String, Value>>) -> ApiResult<Value> {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    validate_email("email", email)?;

    let claims = Claims::new(normalize_email(email), state.config.security.jwt_expiry_hours);
    let token = generate_jwt(&claims, &state.config.security.jwt_secret)?;
    tracing::debug!("Issued token for {}", claims.email);

    Ok(ApiResponse::success(json!({ "token": token })))
}
