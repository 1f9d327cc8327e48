use axum::extract::{Path, State};
use axum::Extension;
use serde_json::{json, Value};

use crate::database::{collections, document::parse_id, models::ClassPayload, InsertOneResult, Update, UpdateOptions, UpdateResult};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, ValidatedUser};
use crate::state::AppState;

/// POST /new-class - submitted classes wait for admin approval
pub async fn post(
    State(state): State<AppState>,
    Extension(instructor): Extension<ValidatedUser>,
    ApiJson(mut payload): ApiJson<ClassPayload>,
) -> ApiResult<InsertOneResult> {
    if payload.instructor_name.is_none() {
        payload.instructor_name = instructor.document.get("name").and_then(Value::as_str).map(str::to_string);
    }
    let document = payload.into_new_document(&instructor.email, &chrono::Utc::now().to_rfc3339())?;
    let result = state.store.insert_one(collections::CLASSES, document).await?;
    tracing::info!("{} submitted class {}", instructor.email, result.inserted_id);
    Ok(ApiResponse::created(result))
}

/// GET /classes/:email
pub async fn list(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Vec<Value>> {
    let filter = Filter::matching(json!({ "instructorEmail": email }))?;
    let classes = state.store.find(collections::CLASSES, &filter).await?;
    Ok(ApiResponse::success(classes))
}

/// PUT /update-class/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ClassPayload>,
) -> ApiResult<UpdateResult> {
    if parse_id(&id).is_none() {
        return Err(ApiError::not_found("Class not found"));
    }
    let filter = Filter::matching(json!({ "_id": id }))?;
    let update = Update::set(payload.into_update_set()?)?;
    let result = state
        .store
        .update_one(collections::CLASSES, &filter, &update, UpdateOptions::upsert())
        .await?;
    Ok(ApiResponse::success(result))
}

#[cfg(test)]
mod tests {
    use crate::testing::{TestApp, ADMIN_EMAIL};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn only_instructors_submit_classes() {
        let app = TestApp::new();
        let class = json!({ "name": "Flow", "availableSeats": "12", "price": 20 });

        let student = app.user("ana@yoga.io", "user").await;
        assert_eq!(app.post("/new-class", Some(&student), class.clone()).await.0, StatusCode::FORBIDDEN);

        // Roles are matched exactly; admins are not instructors
        let admin = app.user(ADMIN_EMAIL, "admin").await;
        assert_eq!(app.post("/new-class", Some(&admin), class.clone()).await.0, StatusCode::FORBIDDEN);

        let lee = app.user("lee@yoga.io", "instructor").await;
        let (status, body) = app.post("/new-class", Some(&lee), class).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["insertedId"].as_str().unwrap().to_string();

        let (_, body) = app.get("/classes/lee@yoga.io", Some(&lee)).await;
        let mine = &body["data"][0];
        assert_eq!(mine["_id"], id.as_str());
        assert_eq!(mine["status"], "pending");
        assert_eq!(mine["availableSeats"], 12);
        assert_eq!(mine["totalEnrolled"], 0);
        assert_eq!(mine["instructorEmail"], "lee@yoga.io");
        // Defaults to the instructor's profile name
        assert_eq!(mine["instructorName"], "lee@yoga.io");
    }

    #[tokio::test]
    async fn edits_send_class_back_to_review() {
        let app = TestApp::new();
        let lee = app.user("lee@yoga.io", "instructor").await;
        let (_, body) = app.post("/new-class", Some(&lee), json!({ "name": "Flow" })).await;
        let id = body["data"]["insertedId"].as_str().unwrap().to_string();
        app.store()
            .update_one(
                crate::database::collections::CLASSES,
                &crate::filter::Filter::matching(json!({ "_id": id })).unwrap(),
                &crate::database::Update::parse(&json!({ "$set": { "status": "approved" } })).unwrap(),
                Default::default(),
            )
            .await
            .unwrap();

        let (status, _) = app
            .request(
                Method::PUT,
                &format!("/update-class/{}", id),
                Some(&lee),
                Some(json!({ "name": "Slow Flow", "availableSeats": 8 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = app.get(&format!("/class/{}", id), None).await;
        assert_eq!(body["data"]["name"], "Slow Flow");
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["availableSeats"], 8);
    }

    #[tokio::test]
    async fn malformed_class_ids_are_not_found() {
        let app = TestApp::new();
        let lee = app.user("lee@yoga.io", "instructor").await;
        let (status, _) = app
            .request(Method::PUT, "/update-class/typo-id", Some(&lee), Some(json!({ "name": "Ghost" })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = app.get("/classes-manage", None).await;
        assert_eq!(body["data"], json!([]));
    }
}
