#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, StatusCode, header},
};
use pinboard::{ServerConfig, create_app, db::Database};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

/// Secret shared by the test server and tests that mint tokens directly.
pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret-used-only-in-tests";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
}

pub async fn setup() -> TestApp {
    setup_with_ttls(
        Duration::from_secs(pinboard::jwt::DEFAULT_ACCESS_TTL_SECS),
        Duration::from_secs(pinboard::jwt::DEFAULT_REFRESH_TTL_SECS),
    )
    .await
}

/// Build an in-process app with custom token lifetimes. A zero access TTL
/// makes every issued access token already expired, which is how the expiry
/// paths are exercised without sleeping.
pub async fn setup_with_ttls(access_ttl: Duration, refresh_ttl: Duration) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");

    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_JWT_SECRET.to_vec(),
        access_ttl,
        refresh_ttl,
    };

    TestApp {
        app: create_app(&config),
        db,
    }
}

impl TestApp {
    /// Send one request through the router.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("Failed to build request"),
            None => builder.body(Body::empty()).expect("Failed to build request"),
        };

        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed")
    }

    /// Create a member through the API.
    pub async fn signup(&self, username: &str, password: &str, nickname: &str) -> StatusCode {
        let response = self
            .request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({
                    "username": username,
                    "password": password,
                    "nickname": nickname,
                })),
            )
            .await;
        response.status()
    }

    /// Log in and return the status plus the response body.
    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let response = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Sign up and log in, returning (access_token, refresh_token).
    pub async fn member(&self, username: &str, password: &str) -> (String, String) {
        let status = self.signup(username, password, username).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK);

        (
            body["accessToken"].as_str().unwrap().to_string(),
            body["refreshToken"].as_str().unwrap().to_string(),
        )
    }

    /// Create a post as the given member, returning its UUID.
    pub async fn create_post(&self, token: &str, title: &str, content: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/posts",
                Some(token),
                Some(json!({ "title": title, "content": content })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["uuid"].as_str().unwrap().to_string()
    }
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not valid JSON")
}
