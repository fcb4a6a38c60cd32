//! Handler tests for Users domain
//!
//! These tests drive the users router over the in-memory repository:
//! - Request deserialization and validation
//! - Response bodies and HTTP status codes
//! - Error bodies
//!
//! Unlike E2E tests, these test ONLY the users domain handlers,
//! not the full application with docs, health checks, etc.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

fn app() -> Router {
    handlers::router(UserService::new(InMemoryUserRepository::new()))
}

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn send_json(method: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn user_json(name: &str, email: &str) -> Value {
    json!({ "name": name, "email": email, "roles": ["user"] })
}

async fn seed(app: &Router, users: &[(&str, &str)]) {
    for (name, email) in users {
        let response = app
            .clone()
            .oneshot(send_json("POST", user_json(name, email)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_create_user_returns_201() {
    let response = app()
        .oneshot(send_json("POST", user_json("jane", "jane@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(
        body,
        json!({ "name": "jane", "email": "jane@example.com", "roles": ["user"] })
    );
}

#[tokio::test]
async fn test_create_user_validates_fields() {
    let response = app()
        .oneshot(send_json(
            "POST",
            json!({ "name": "", "email": "not-an-email", "roles": [] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["errors"]["name"], "Name is required");
    assert_eq!(body["errors"]["email"], "Email must be valid");
    assert_eq!(body["errors"]["roles"], "At least one role is required");
    assert!(body["timestamp"].is_i64());
}

#[tokio::test]
async fn test_null_name_is_reported_as_missing() {
    let response = app()
        .oneshot(send_json(
            "POST",
            json!({ "name": null, "email": "jane@example.com", "roles": ["USER"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"], json!({ "name": "Name is required" }));
}

#[tokio::test]
async fn test_null_roles_are_reported_as_missing() {
    let response = app()
        .oneshot(send_json(
            "POST",
            json!({ "name": "jane", "email": "jane@example.com", "roles": null }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["errors"], json!({ "roles": "At least one role is required" }));
}

#[tokio::test]
async fn test_single_label_domain_is_accepted() {
    let response = app()
        .oneshot(send_json("POST", user_json("jane", "jane@localhost")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_name_returns_409() {
    let app = app();
    seed(&app, &[("jane", "jane@example.com")]).await;

    let response = app
        .oneshot(send_json("POST", user_json("jane", "other@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "User with username jane already exists");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn test_duplicate_email_returns_409() {
    let app = app();
    seed(&app, &[("jane", "jane@example.com")]).await;

    let response = app
        .clone()
        .oneshot(send_json("POST", user_json("janet", "jane@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "User with email jane@example.com already exists");

    let list: Vec<UserResponse> = json_body(app.oneshot(get("/")).await.unwrap().into_body()).await;
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn test_update_user_changes_name_and_roles() {
    let app = app();
    seed(&app, &[("jane", "jane@example.com")]).await;

    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            json!({ "name": "janet", "email": "jane@example.com", "roles": ["admin"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let user: UserResponse = json_body(response.into_body()).await;
    assert_eq!(user.name.as_deref(), Some("janet"));
    assert_eq!(user.email.as_deref(), Some("jane@example.com"));
    assert_eq!(user.roles, vec!["admin"]);
}

#[tokio::test]
async fn test_update_unknown_user_returns_404() {
    let response = app()
        .oneshot(send_json("PUT", user_json("ghost", "ghost@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "User with email ghost@example.com not found");
}

#[tokio::test]
async fn test_delete_unknown_user_returns_404() {
    let response = app().oneshot(delete("/ghost@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_get_delete_round_trip() {
    let app = app();
    seed(&app, &[("jane", "jane@example.com")]).await;

    let response = app.clone().oneshot(get("/jane@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user: UserResponse = json_body(response.into_body()).await;
    assert_eq!(user.name.as_deref(), Some("jane"));

    let response = app.clone().oneshot(delete("/jane@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/jane@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_round_trip_keeps_payload_verbatim() {
    let app = app();
    let payload = json!({ "name": "Test User", "email": "test@example.com", "roles": ["USER"] });

    let response = app
        .clone()
        .oneshot(send_json("POST", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body, payload);

    let response = app.clone().oneshot(get("/test@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body, payload);

    let response = app.clone().oneshot(delete("/test@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/test@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_without_paging_returns_array() {
    let app = app();
    seed(&app, &[("bob", "bob@example.com"), ("alice", "alice@example.com")]).await;

    // Partial paging parameters fall back to the plain listing
    let response = app.oneshot(get("/?page=0&size=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let users: Vec<UserResponse> = json_body(response.into_body()).await;
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_list_paged_sorted_by_name() {
    let app = app();
    seed(
        &app,
        &[
            ("carol", "carol@example.com"),
            ("alice", "alice@example.com"),
            ("bob", "bob@example.com"),
        ],
    )
    .await;

    let response = app
        .oneshot(get("/?page=0&size=2&sortBy=name&sortDirection=desc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: PageResponse<UserResponse> = json_body(response.into_body()).await;
    let names: Vec<_> = page.content.iter().filter_map(|u| u.name.as_deref()).collect();
    assert_eq!(names, vec!["carol", "bob"]);
    assert_eq!(
        page.page,
        PageMetadata {
            size: 2,
            number: 0,
            total_elements: 3,
            total_pages: 2
        }
    );
}

#[tokio::test]
async fn test_list_page_beyond_last_is_empty() {
    let app = app();
    seed(&app, &[("alice", "alice@example.com")]).await;

    let response = app
        .oneshot(get("/?page=5&size=10&sortBy=id&sortDirection=ASC"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: PageResponse<UserResponse> = json_body(response.into_body()).await;
    assert!(page.content.is_empty());
    assert_eq!(page.page.total_elements, 1);
}

#[tokio::test]
async fn test_list_invalid_paging_returns_400() {
    let response = app()
        .oneshot(get("/?page=-1&size=500&sortBy=age&sortDirection=up"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["errors"]["page"], "Page number must be non-negative");
    assert_eq!(body["errors"]["size"], "Page size cannot exceed 100");
    assert_eq!(body["errors"]["sortBy"], "Sort field must be one of: id, email, name");
    assert_eq!(body["errors"]["sortDirection"], "Sort direction must be either ASC or DESC");
}
