// crates/taskvault-lib/tests/auth_flow.rs
//! End-to-end tests for the account routes driven through the router.
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use taskvault_lib::{config::Settings, db, routes, AppState};

async fn test_app() -> Router {
    let pool = db::connect_in_memory().await.unwrap();
    let settings = Settings {
        jwt_secret: "integration-test-secret".to_string(),
        ..Settings::default()
    };
    routes::create_router(AppState::new(pool, settings))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_body(email: &str, username: &str) -> Value {
    json!({ "email": email, "username": username, "password": "Secur3!pass" })
}

#[tokio::test]
async fn register_returns_account_without_hash() {
    let app = test_app().await;

    let response = app
        .oneshot(post_json("/auth/register", register_body("a@x.com", "alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_active"], true);
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_with_specific_reason() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/auth/register", register_body("a@x.com", "alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_json("/auth/register", register_body("a@x.com", "bob")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Email already registered");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict_with_specific_reason() {
    let app = test_app().await;

    app.clone()
        .oneshot(post_json("/auth/register", register_body("a@x.com", "alice")))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json("/auth/register", register_body("b@x.com", "alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Username already taken");
}

#[tokio::test]
async fn invalid_registration_fields_are_bad_requests() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/register",
            json!({ "email": "not-an-email", "username": "alice", "password": "Secur3!pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/register",
            json!({ "email": "a@x.com", "username": "a!", "password": "Secur3!pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/auth/register",
            json!({ "email": "a@x.com", "username": "alice", "password": "weakpass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_returns_bearer_token_and_me_resolves_it() {
    let app = test_app().await;

    app.clone()
        .oneshot(post_json("/auth/register", register_body("a@x.com", "alice")))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/login",
            json!({ "email": "a@x.com", "password": "Secur3!pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["access_token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["username"], "alice");
    let user_id = body["user_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], user_id.as_str());
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = test_app().await;

    app.clone()
        .oneshot(post_json("/auth/register", register_body("a@x.com", "alice")))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/login",
            json!({ "email": "a@x.com", "password": "Wrong1!pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown email gets the same response shape.
    let response = app
        .oneshot(post_json(
            "/auth/login",
            json!({ "email": "nobody@x.com", "password": "Secur3!pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Incorrect email or password");
}

#[tokio::test]
async fn me_rejects_missing_and_invalid_tokens() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .header("authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn security_headers_attached_to_every_response() {
    let app = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("strict-transport-security"));
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("referrer-policy"));
}

#[tokio::test]
async fn register_rate_limit_kicks_in() {
    let app = test_app().await;
    let limit = Settings::default().rate_limit.register_per_min;

    for i in 0..limit {
        let response = app
            .clone()
            .oneshot(post_json(
                "/auth/register",
                register_body(&format!("u{i}@x.com"), &format!("user{i}")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(post_json(
            "/auth/register",
            register_body("late@x.com", "latecomer"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
