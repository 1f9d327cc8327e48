use axum::extract::{Path, State};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{EnrolledClass, EnrollmentService};
use crate::state::AppState;

/// GET /enrolled-classes/:email
pub async fn list(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Vec<EnrolledClass>> {
    let enrolled = EnrollmentService::new(state.store.clone()).enrolled_classes(&email).await?;
    Ok(ApiResponse::success(enrolled))
}
