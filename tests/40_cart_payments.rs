mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn payment_updates_seats_and_enrollments() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let teacher_email = common::unique_email("kim");
    let teacher = common::instructor_token(server, &teacher_email).await?;
    let class_id = client
        .post(server.url("/new-class"))
        .bearer_auth(&teacher)
        .json(&json!({ "name": "Yin Evenings", "availableSeats": 2, "price": 12 }))
        .send()
        .await?
        .json::<Value>()
        .await?["data"]["insertedId"]
        .as_str()
        .unwrap()
        .to_string();

    let student_email = common::unique_email("ana");
    common::sign_up(server, &student_email).await?;
    let student = common::token_for(server, &student_email).await?;

    let res = client
        .post(server.url("/add-to-cart"))
        .bearer_auth(&student)
        .json(&json!({ "classId": class_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let cart = client
        .get(server.url(&format!("/cart/{}", student_email)))
        .bearer_auth(&student)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(cart["data"][0]["_id"], class_id.as_str());

    let res = client
        .post(server.url(&format!("/payment-info?classId={}", class_id)))
        .bearer_auth(&student)
        .json(&json!({ "transactionId": "pi_test_1", "price": 12, "userName": "Ana" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let class = reqwest::get(server.url(&format!("/class/{}", class_id))).await?.json::<Value>().await?;
    assert_eq!(class["data"]["availableSeats"], 1);
    assert_eq!(class["data"]["totalEnrolled"], 1);

    let cart = client
        .get(server.url(&format!("/cart/{}", student_email)))
        .bearer_auth(&student)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(cart["data"].as_array().map(Vec::len), Some(0));

    let enrolled = client
        .get(server.url(&format!("/enrolled-classes/{}", student_email)))
        .bearer_auth(&student)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(enrolled["data"][0]["classes"]["name"], "Yin Evenings");
    assert_eq!(enrolled["data"][0]["instructor"]["email"], teacher_email.as_str());

    let count = client
        .get(server.url(&format!("/payment-history-length/{}", student_email)))
        .bearer_auth(&student)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(count["data"]["count"], 1);
    Ok(())
}
