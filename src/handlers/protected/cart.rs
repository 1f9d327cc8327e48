use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::{collections, models::CartItem, DeleteResult, InsertOneResult};
use crate::filter::Filter;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::CartService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CartItemQuery {
    pub email: Option<String>,
}

/// POST /add-to-cart
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(item): ApiJson<CartItem>,
) -> ApiResult<InsertOneResult> {
    let document = item.into_document(&user.email, &chrono::Utc::now().to_rfc3339())?;
    let result = state.store.insert_one(collections::CART, document).await?;
    Ok(ApiResponse::created(result))
}

/// GET /cart-item/:id?email= - whether the class is already in the user's cart.
/// Data is `{ _id, classId }` or null.
pub async fn item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(class_id): Path<String>,
    ApiQuery(query): ApiQuery<CartItemQuery>,
) -> ApiResult<Option<Value>> {
    let email = query.email.unwrap_or(user.email);
    let mut filter = Filter::matching(json!({ "classId": class_id, "userMail": email }))?;
    filter.select(json!({ "classId": 1 }))?;

    let item = state.store.find_one(collections::CART, &filter).await?;
    Ok(ApiResponse::success(item))
}

/// GET /cart/:email - the classes in a user's cart
pub async fn list(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Vec<Value>> {
    let classes = CartService::new(state.store.clone()).cart_classes(&email).await?;
    Ok(ApiResponse::success(classes))
}

/// DELETE /delete-cart-item/:id - removes the caller's cart item for a class
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(class_id): Path<String>,
) -> ApiResult<DeleteResult> {
    let filter = Filter::matching(json!({ "classId": class_id, "userMail": user.email }))?;
    let result = state.store.delete_one(collections::CART, &filter).await?;
    Ok(ApiResponse::success(result))
}
