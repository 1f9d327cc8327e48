use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;
use crate::database::{collections, DocumentStore, MemoryDocumentStore};
use crate::{app, AppState};

pub const ADMIN_EMAIL: &str = "admin@yoga.io";

/// Router over a fresh in-memory store, driven with `oneshot`
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = AppConfig::development();
        config.security.bootstrap_admins = vec![ADMIN_EMAIL.to_string()];
        config.api.enable_request_logging = false;

        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let state = AppState::new(store, config);
        let router = app(state.clone());
        Self { state, router }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.state.store
    }

    pub fn token(&self, email: &str) -> String {
        let claims = Claims::new(email, 1);
        generate_jwt(&claims, &self.state.config.security.jwt_secret).expect("test token")
    }

    /// Inserts a user document directly and returns a token for it
    pub async fn user(&self, email: &str, role: &str) -> String {
        self.store()
            .insert_one(collections::USERS, serde_json::json!({ "name": email, "email": email, "role": role }))
            .await
            .expect("seed user");
        self.token(email)
    }

    pub async fn insert(&self, collection: &str, doc: Value) -> String {
        self.store().insert_one(collection, doc).await.expect("seed document").inserted_id
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }
}
