//! Public pages, unknown routes and response headers.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{assert_redirect, header_value, register, spawn_app};

#[tokio::test]
async fn test_root_redirects_home() {
    let app = spawn_app().await;
    let response = app.server.get("/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(header_value(&response, header::LOCATION), "/caredata");
}

#[tokio::test]
async fn test_public_pages_render() {
    let app = spawn_app().await;

    for path in ["/caredata", "/doctorsProfile", "/caredata/doctors", "/register", "/login"] {
        let response = app.server.get(path).await;
        response.assert_status_ok();
        assert!(header_value(&response, header::CONTENT_TYPE).starts_with("text/html"));
        assert!(response.text().contains("Log in"), "{path} shows the anonymous header");
    }
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_unknown_path_is_not_found_for_every_verb() {
    let app = spawn_app().await;

    for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
        let response = app.server.method(method.clone(), "/no/such/page").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body = response.text();
        assert!(body.contains("Page Not Found!"), "{method} renders the error page");
        assert!(body.contains("Back to CareData"));
    }
}

#[tokio::test]
async fn test_wrong_method_renders_not_found() {
    let app = spawn_app().await;

    let response = app.server.delete("/caredata").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().contains("Page Not Found!"));
    assert!(response.headers().get(header::ALLOW).is_none());

    let response = app.server.get("/logout").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_error_page_shows_signed_in_user() {
    let app = spawn_app().await;
    register(&app.server, "alice", "patient").await;

    let body = app.server.get("/no/such/page").await.text();
    assert!(body.contains("Test alice"));
    assert!(body.contains("Log out"));
}

#[tokio::test]
async fn test_security_headers() {
    let app = spawn_app().await;

    for path in ["/caredata", "/no/such/page"] {
        let response = app.server.get(path).await;
        assert_eq!(header_value(&response, header::X_CONTENT_TYPE_OPTIONS), "nosniff");
        assert_eq!(header_value(&response, header::X_FRAME_OPTIONS), "DENY");
        assert!(!header_value(&response, header::CONTENT_SECURITY_POLICY).is_empty());
        assert_eq!(header_value(&response, header::CACHE_CONTROL), "no-store, max-age=0");
    }
}

#[tokio::test]
async fn test_session_cookie_attributes() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/register")
        .multipart(common::registration_form("alice", "patient"))
        .await;
    assert_redirect(&response, "/caredata/users/1");

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect();
    let session = cookies
        .iter()
        .find(|c| c.starts_with("session="))
        .expect("session cookie set");
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Lax"));
    assert!(session.contains("Path=/"));
    assert!(session.contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_rejected_request_body_renders_error_page() {
    let app = spawn_app().await;
    let id = register(&app.server, "alice", "patient").await;

    let response = app
        .server
        .put(&format!("/caredata/users/{id}"))
        .json(&serde_json::json!({ "full_name": "Alice", "email": "alice@example.com" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(header_value(&response, header::CONTENT_TYPE).starts_with("text/html"));
    assert!(response.text().contains("The request could not be understood."));

    let response = app.new_client().post("/register").text("not a form").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.text().contains("Back to CareData"));
}
