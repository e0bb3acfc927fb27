//! The users module mounted behind the ingress exactly as the server binary does it.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tower::ServiceExt;

use api_ingress::{ApiIngress, ApiIngressConfig, BasicAuthenticator};
use users::{config::UsersConfig, Users};

const USER: &str = "admin";
const PASS: &str = "hunter22";

fn app_with(cfg: ApiIngressConfig) -> Router {
    let users = Users::new(UsersConfig::default());
    let protected = users.register_rest(Router::new());
    ApiIngress::new(cfg, BasicAuthenticator::new(USER, PASS, Some("users".into())))
        .build_router(protected, Some(users.openapi()))
        .unwrap()
}

fn app() -> Router {
    app_with(ApiIngressConfig::default())
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_owned()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn johndoe() -> String {
    json!({
        "username": "johndoe",
        "email": "john@example.com",
        "password": "secret123"
    })
    .to_string()
}

/// Every user operation, with a body that would be valid or invalid.
fn operations(payload: &str) -> Vec<(&'static str, &'static str, Option<String>)> {
    vec![
        ("GET", "/users", None),
        ("POST", "/users", Some(payload.to_owned())),
        ("GET", "/users/1", None),
        ("PUT", "/users/1", Some(payload.to_owned())),
        ("PATCH", "/users/1", Some(payload.to_owned())),
        ("DELETE", "/users/1", None),
    ]
}

#[tokio::test]
async fn create_with_valid_credentials_returns_record() {
    let app = app();
    let auth = basic(USER, PASS);

    let resp = send(&app, request("POST", "/users", Some(&auth), Some(&johndoe()))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(
        json_body(resp).await,
        json!({
            "id": 1,
            "username": "johndoe",
            "email": "john@example.com",
            "full_name": null
        })
    );

    let resp = send(&app, request("GET", "/users/1", Some(&auth), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["username"], "johndoe");
}

#[tokio::test]
async fn wrong_password_is_unauthorized_for_every_operation() {
    let app = app();
    let wrong = basic(USER, "not-the-password");

    for (method, uri, body) in operations(&johndoe()) {
        let resp = send(&app, request(method, uri, Some(&wrong), body.as_deref())).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"users\"",
            "{method} {uri}"
        );
        assert_eq!(json_body(resp).await["code"], "AUTH_UNAUTHORIZED");
    }
}

#[tokio::test]
async fn missing_credentials_win_over_invalid_payloads() {
    let app = app();

    for payload in ["{ not json", r#"{"username":"x","password":"1"}"#] {
        for (method, uri, body) in operations(payload) {
            let resp = send(&app, request(method, uri, None, body.as_deref())).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
        }
    }

    // Bad ids are not parsed before auth either.
    let resp = send(&app, request("GET", "/users/abc", None, None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Nothing was created by the rejected requests.
    let resp = send(&app, request("GET", "/users", Some(&basic(USER, PASS)), None)).await;
    assert_eq!(json_body(resp).await, json!([]));
}

#[tokio::test]
async fn oversized_unauthenticated_create_is_unauthorized() {
    let app = app_with(ApiIngressConfig {
        body_limit_bytes: 16,
        ..Default::default()
    });
    let body = johndoe();
    assert!(body.len() > 16);

    let req = Request::builder()
        .method("POST")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body.clone()))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let req = Request::builder()
        .method("POST")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, basic(USER, PASS))
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn openapi_documents_user_routes_without_credentials() {
    let resp = send(&app(), request("GET", "/openapi.json", None, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let doc = json_body(resp).await;
    assert!(doc["paths"]["/users"]["post"].is_object());
    assert!(doc["paths"]["/users/{id}"]["patch"].is_object());
    assert_eq!(
        doc["components"]["securitySchemes"]["basic_auth"]["scheme"],
        "basic"
    );
}
