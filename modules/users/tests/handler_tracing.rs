//! Tests to verify that handlers log requests and map storage failures

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use tracing_test::traced_test;

use users::config::UsersConfig;
use users::contract::model::User;
use users::domain::repo::{UserDraft, UsersRepository};
use users::Users;

/// Repository whose every call fails, to drive the 500 path.
struct BrokenRepository;

#[async_trait::async_trait]
impl UsersRepository for BrokenRepository {
    async fn find_by_id(&self, _id: u64) -> Result<Option<User>> {
        Err(anyhow!("disk on fire"))
    }

    async fn list(&self) -> Result<Vec<User>> {
        Err(anyhow!("disk on fire"))
    }

    async fn insert(&self, _draft: UserDraft) -> Result<User> {
        Err(anyhow!("disk on fire"))
    }

    async fn update(&self, _user: User) -> Result<bool> {
        Err(anyhow!("disk on fire"))
    }

    async fn delete(&self, _id: u64) -> Result<bool> {
        Err(anyhow!("disk on fire"))
    }
}

fn broken_router() -> Router {
    Users::with_repository(Arc::new(BrokenRepository), &UsersConfig::default())
        .register_rest(Router::new())
}

#[traced_test]
#[tokio::test]
async fn storage_failure_maps_to_internal_problem() {
    let app = broken_router();

    let request = Request::builder()
        .method("GET")
        .uri("/users")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let problem: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(problem["code"], "INTERNAL");
    assert!(!problem["detail"].as_str().unwrap().contains("disk on fire"));

    assert!(logs_contain("Failed to list users"));
    assert!(logs_contain("Storage error occurred"));
}

#[traced_test]
#[tokio::test]
async fn create_user_handler_logs_without_password() {
    let app = Users::default().register_rest(Router::new());

    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "username": "logcheck",
                "email": "logcheck@example.com",
                "password": "very-secret-pw"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    assert!(logs_contain("Creating user: logcheck"));
    assert!(!logs_contain("very-secret-pw"));
}

#[traced_test]
#[tokio::test]
async fn not_found_is_logged_by_handler() {
    let app = Users::default().register_rest(Router::new());

    let request = Request::builder()
        .method("DELETE")
        .uri("/users/9")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(logs_contain("Failed to delete user 9"));
}
