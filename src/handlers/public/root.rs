use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Yoga Master API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Class marketplace backend: classes, carts, payments, enrollments and instructors",
            "endpoints": {
                "public": "/classes, /class/:id, /popular_classes, /popular-instructors, /instructors, /new-user, /api/set-token",
                "protected": "/user/:email, /cart/:email, /add-to-cart, /payment-info, /enrolled-classes/:email (Bearer token)",
                "admin": "/admin-stats, /change-status/:id, /update-user/:id, /delete-user/:id",
                "instructor": "/new-class, /classes/:email, /update-class/:id",
            }
        }
    }))
}

/// GET /health - pings the document store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
