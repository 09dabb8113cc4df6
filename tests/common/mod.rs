//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use axum::http::{header, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer, TestServerConfig};
use tempfile::TempDir;

use caredata::web::{create_router, AppState};
use caredata::{Config, Database};

/// A test password that satisfies the registration rules.
pub const PASSWORD: &str = "correct-horse-battery";

/// One running application with its state and storage directory.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _storage: TempDir,
}

impl TestApp {
    /// A second browser talking to the same application.
    pub fn new_client(&self) -> TestServer {
        client(self.state.clone())
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }
}

fn client(state: AppState) -> TestServer {
    let config = TestServerConfig {
        save_cookies: true,
        ..TestServerConfig::default()
    };
    TestServer::new_with_config(create_router(state), config).expect("Failed to create test server")
}

/// Start an application on an in-memory database.
pub async fn spawn_app() -> TestApp {
    let storage = TempDir::new().expect("Failed to create storage dir");

    let mut config = Config::default();
    config.session.secret = "test-secret-key-for-testing-only-0123456789".to_string();
    config.files.storage_path = storage.path().to_string_lossy().into_owned();
    config.files.max_upload_size_mb = 1;

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let state = AppState::new(db, &config).expect("Failed to build app state");

    TestApp {
        server: client(state.clone()),
        state,
        _storage: storage,
    }
}

/// Registration form with the given username and role.
pub fn registration_form(username: &str, role: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("username", username.to_string())
        .add_text("email", format!("{username}@example.com"))
        .add_text("full_name", format!("Test {username}"))
        .add_text("password", PASSWORD)
        .add_text("role", role.to_string())
}

/// Register through the web form; the client ends up logged in.
pub async fn register(server: &TestServer, username: &str, role: &str) -> i64 {
    let response = server
        .post("/register")
        .multipart(registration_form(username, role))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let location = location(&response);
    location
        .strip_prefix("/caredata/users/")
        .and_then(|id| id.parse().ok())
        .unwrap_or_else(|| panic!("Unexpected registration redirect: {location}"))
}

/// Log in through the web form.
pub async fn login(server: &TestServer, username: &str, password: &str) -> TestResponse {
    server
        .post("/login")
        .form(&[("username", username), ("password", password)])
        .await
}

/// The `Location` header of a redirect.
pub fn location(response: &TestResponse) -> String {
    header_value(response, header::LOCATION)
}

/// Assert a 303 redirect to `path`.
pub fn assert_redirect(response: &TestResponse, path: &str) {
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(response), path);
}

/// A tiny PNG-named payload; content is not inspected.
pub fn image_part(name: &str) -> Part {
    Part::bytes(b"\x89PNG\r\n\x1a\nfake".to_vec())
        .file_name(name.to_string())
        .mime_type("image/png")
}

/// Count rows of a table.
pub async fn count_rows(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .expect("Failed to count rows")
}

/// A response header as a string, empty when absent.
pub fn header_value(response: &TestResponse, name: header::HeaderName) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
