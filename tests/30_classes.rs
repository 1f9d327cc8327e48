mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn class_review_flow() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let email = common::unique_email("lee");
    let instructor = common::instructor_token(server, &email).await?;

    let res = client
        .post(server.url("/new-class"))
        .bearer_auth(&instructor)
        .json(&json!({ "name": "Sunrise Vinyasa", "availableSeats": "15", "price": 30 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = res.json::<Value>().await?["data"]["insertedId"].as_str().unwrap().to_string();

    let mine = client
        .get(server.url(&format!("/classes/{}", email)))
        .bearer_auth(&instructor)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(mine["data"][0]["status"], "pending");
    assert_eq!(mine["data"][0]["availableSeats"], 15);

    // Pending classes stay out of the catalogue
    let catalogue = reqwest::get(server.url("/classes")).await?.json::<Value>().await?;
    assert!(!catalogue["data"].as_array().unwrap().iter().any(|c| c["_id"] == id.as_str()));

    let admin = common::admin_token(server).await?;
    let res = client
        .patch(server.url(&format!("/change-status/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "status": "approved" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let catalogue = reqwest::get(server.url("/classes")).await?.json::<Value>().await?;
    assert!(catalogue["data"].as_array().unwrap().iter().any(|c| c["_id"] == id.as_str()));

    // Editing sends the class back to review
    client
        .put(server.url(&format!("/update-class/{}", id)))
        .bearer_auth(&instructor)
        .json(&json!({ "name": "Sunrise Vinyasa II" }))
        .send()
        .await?
        .error_for_status()?;
    let class = reqwest::get(server.url(&format!("/class/{}", id))).await?.json::<Value>().await?;
    assert_eq!(class["data"]["status"], "pending");
    assert_eq!(class["data"]["name"], "Sunrise Vinyasa II");
    Ok(())
}

#[tokio::test]
async fn students_cannot_submit_classes() -> Result<()> {
    let server = common::ensure_server().await?;
    let email = common::unique_email("student");
    common::sign_up(server, &email).await?;
    let token = common::token_for(server, &email).await?;

    let res = reqwest::Client::new()
        .post(server.url("/new-class"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Sneaky" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
