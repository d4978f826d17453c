//! Common test utilities for API integration tests
//!
//! Builds the full router over the in-memory store with cheap password
//! hashing, and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use strata_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, JwtConfig, LogFormat, PasswordConfig, StorageBackend},
};
use strata_shared::{services::Services, store::MemoryStore};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context holding the router and its backing store
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

/// A registered, logged-in user
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        storage: StorageBackend::Memory,
        database: None,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        password: PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        log_format: LogFormat::Pretty,
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();
        let services = Services::new(store.clone(), config.jwt.secret.clone(), config.password.into());

        Self {
            app: build_router(AppState::new(services, config)),
            store,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body parses as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Sends a raw, possibly malformed, JSON body
    pub async fn post_raw(&self, uri: &str, token: &str, body: &str) -> StatusCode {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.app.clone().oneshot(request).await.unwrap().status()
    }

    /// Registers and logs in a user named `name`
    pub async fn user(&self, name: &str) -> TestUser {
        let email = format!("{}@example.com", name);

        let (status, _) = self
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "email": email, "username": name, "password": "hunter2-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": "hunter2-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email,
            token: body["access_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project owned by `user` and returns its id
    pub async fn project(&self, user: &TestUser, name: &str) -> String {
        let (status, body) = self
            .post("/projects", &user.token, json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates content with its first version and returns the content id
    pub async fn content(&self, user: &TestUser, project_id: &str, title: &str, prompt: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/contents/project/{}", project_id),
                &user.token,
                json!({ "title": title, "prompt": prompt }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["content_id"].as_str().unwrap().to_string()
    }
}
