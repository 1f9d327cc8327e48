#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use yoga_master_api::config::AppConfig;
use yoga_master_api::database::MemoryDocumentStore;
use yoga_master_api::{app, AppState};

pub const ADMIN_EMAIL: &str = "root@yoga-master.test";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.security.jwt_secret = "integration-test-secret".to_string();
        config.security.bootstrap_admins = vec![ADMIN_EMAIL.to_string()];
        config.api.enable_request_logging = false;
        let state = AppState::new(Arc::new(MemoryDocumentStore::new()), config);

        // Each #[tokio::test] owns a short-lived runtime, so the server gets its own
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build server runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
                    .await
                    .expect("failed to bind test port");
                axum::serve(listener, app(state)).await.expect("test server failed");
            });
        });

        Ok(Self { port, base_url })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to start test server"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Emails are unique per call since every test in a binary shares one store
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@yoga-master.test", prefix, uuid::Uuid::new_v4().simple())
}

pub async fn token_for(server: &TestServer, email: &str) -> Result<String> {
    let body: Value = reqwest::Client::new()
        .post(server.url("/api/set-token"))
        .json(&json!({ "email": email }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("token missing from response")
}

/// Signs a user up and returns their id
pub async fn sign_up(server: &TestServer, email: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/new-user"))
        .json(&json!({ "name": email, "email": email }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "sign up failed: {}", res.status());
    let body: Value = res.json().await?;
    body["data"]["insertedId"]
        .as_str()
        .map(str::to_string)
        .context("insertedId missing from response")
}

/// Token for the bootstrap admin, signing it up on first use
pub async fn admin_token(server: &TestServer) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/new-user"))
        .json(&json!({ "name": "Root", "email": ADMIN_EMAIL }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED || res.status() == StatusCode::CONFLICT,
        "admin sign up failed: {}",
        res.status()
    );
    token_for(server, ADMIN_EMAIL).await
}

/// Signs a user up and has the admin promote them to instructor
pub async fn instructor_token(server: &TestServer, email: &str) -> Result<String> {
    let id = sign_up(server, email).await?;
    let admin = admin_token(server).await?;
    reqwest::Client::new()
        .put(server.url(&format!("/update-user/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "role": "instructor", "email": email }))
        .send()
        .await?
        .error_for_status()?;
    token_for(server, email).await
}
