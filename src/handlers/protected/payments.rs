use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::{collections, models::PaymentInfo};
use crate::filter::Filter;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::{EnrollmentService, PaymentOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    #[serde(rename = "classId")]
    pub class_id: Option<String>,
}

/// POST /payment-info?classId=
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<PaymentQuery>,
    ApiJson(info): ApiJson<PaymentInfo>,
) -> ApiResult<PaymentOutcome> {
    let prepared = info.prepare(&user.email, query.class_id, &chrono::Utc::now().to_rfc3339())?;
    let outcome = EnrollmentService::new(state.store.clone()).record_payment(prepared).await?;
    Ok(ApiResponse::created(outcome))
}

/// GET /payment-history/:email - newest first
pub async fn history(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Vec<Value>> {
    let mut filter = Filter::matching(json!({ "userEmail": email }))?;
    filter.order(json!({ "date": -1 }))?;
    let payments = state.store.find(collections::PAYMENTS, &filter).await?;
    Ok(ApiResponse::success(payments))
}

/// GET /payment-history-length/:email
pub async fn history_length(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Value> {
    let filter = Filter::matching(json!({ "userEmail": email }))?;
    let count = state.store.count(collections::PAYMENTS, &filter).await?;
    Ok(ApiResponse::success(json!({ "count": count })))
}

#[cfg(test)]
mod tests {
    use crate::database::collections;
    use crate::testing::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn payment_enrolls_and_lists_history() {
        let app = TestApp::new();
        let token = app.user("ana@yoga.io", "user").await;
        app.user("lee@yoga.io", "instructor").await;
        let flow = app
            .insert(
                collections::CLASSES,
                json!({ "name": "Flow", "availableSeats": 5, "totalEnrolled": 0, "instructorEmail": "lee@yoga.io" }),
            )
            .await;
        app.post("/add-to-cart", Some(&token), json!({ "classId": flow })).await;

        let (status, body) = app
            .post(
                &format!("/payment-info?classId={}", flow),
                Some(&token),
                json!({ "transactionId": "tx_1", "price": 20, "date": "2026-10-01T09:00:00+00:00" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["deletedResult"]["deletedCount"], 1);
        assert_eq!(body["data"]["updatedResult"]["modifiedCount"], 1);

        let (_, body) = app.get(&format!("/class/{}", flow), None).await;
        assert_eq!(body["data"]["availableSeats"], 4);
        assert_eq!(body["data"]["totalEnrolled"], 1);

        app.post(
            "/payment-info",
            Some(&token),
            json!({ "transactionId": "tx_2", "classesId": [flow], "date": "2026-10-05T09:00:00+00:00" }),
        )
        .await;

        let (_, body) = app.get("/payment-history/ana@yoga.io", Some(&token)).await;
        assert_eq!(body["data"][0]["transactionId"], "tx_2");
        assert_eq!(body["data"][1]["transactionId"], "tx_1");

        let (_, body) = app.get("/payment-history-length/ana@yoga.io", Some(&token)).await;
        assert_eq!(body["data"]["count"], 2);

        let (_, body) = app.get("/enrolled-classes/ana@yoga.io", Some(&token)).await;
        let enrolled = body["data"].as_array().unwrap();
        assert_eq!(enrolled.len(), 2);
        assert_eq!(enrolled[0]["classes"]["name"], "Flow");
        assert_eq!(enrolled[0]["instructor"]["email"], "lee@yoga.io");
    }

    #[tokio::test]
    async fn payment_without_classes_is_rejected() {
        let app = TestApp::new();
        let token = app.token("ana@yoga.io");
        let (status, _) = app.post("/payment-info", Some(&token), json!({ "transactionId": "tx_9" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
