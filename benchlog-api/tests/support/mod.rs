//! Shared harness for the HTTP-level tests: a full router over an
//! in-memory store, plus request helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use benchlog_api::{auth::JwtSecret, create_api_router, ApiConfig, AuthConfig, StorageBackend};
use benchlog_test_utils::{fixtures::seeded_store, InMemoryStore};
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_EMAIL: &str = "tester@lab.example.org";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// A router plus the temp directory its uploads land in.
pub struct TestApp {
    pub router: Router,
    pub upload_dir: TempDir,
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: JwtSecret::new("integration-test-secret-with-plenty-of-chars".to_string())
            .expect("secret"),
        ..AuthConfig::default()
    }
}

pub fn app_over(store: InMemoryStore, max_upload_bytes: usize) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("tempdir");
    let api_config = ApiConfig {
        storage: StorageBackend::Memory,
        upload_dir: upload_dir.path().join("uploads"),
        max_upload_bytes,
        ..ApiConfig::default()
    };
    let router =
        create_api_router(Arc::new(store), &api_config, test_auth_config()).expect("router");
    TestApp { router, upload_dir }
}

/// App over a lab with `equipment` equipment rows, `reagents` reagents,
/// one facility and record 1.
pub async fn seeded_app(equipment: usize, reagents: usize) -> TestApp {
    let store = seeded_store(equipment, reagents).await.expect("seed store");
    app_over(store, 1024 * 1024)
}

impl TestApp {
    /// Send a request and decode the body as JSON (`Null` when empty or not JSON).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
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
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
        (status, value)
    }

    /// Register the standard test user and return its token.
    pub async fn token(&self) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD, "name": "Tester" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        body["access_token"]
            .as_str()
            .expect("access_token")
            .to_string()
    }
}

/// Hand-built `multipart/form-data` body with a single `file` part.
pub fn multipart_file(boundary: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
