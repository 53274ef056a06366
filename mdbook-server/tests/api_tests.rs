//! Integration tests for the mdbook Server API

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use mdbook_server::config::Settings;
use mdbook_server::routes::create_router;
use mdbook_server::state::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;

const APIKEY: &str = "test-key";

/// Create a test app state over an empty library directory
fn create_test_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings {
        dir: temp_dir.path().to_path_buf(),
        user: "admin".to_string(),
        password: "secret".to_string(),
        development: false,
        apikey: Some(APIKEY.to_string()),
        addr: "127.0.0.1:0".parse().unwrap(),
        cors_origins: None,
    };
    let state = AppState::new(settings).expect("Failed to open library");
    (state, temp_dir)
}

/// Create a test server
fn create_test_server() -> (TestServer, TempDir) {
    let (state, temp_dir) = create_test_state();
    let app = create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, temp_dir)
}

/// Add the API key header to a request
fn keyed(request: TestRequest) -> TestRequest {
    request.add_header(
        HeaderName::from_static("mdbook_apikey"),
        HeaderValue::from_static(APIKEY),
    )
}

/// Server with a book `moon` holding a section `phases` with a text `full`
async fn server_with_book() -> (TestServer, TempDir) {
    let (server, temp_dir) = create_test_server();
    keyed(server.post("/api/v1/books"))
        .json(&json!({ "title": "Moon" }))
        .await
        .assert_status(StatusCode::CREATED);
    keyed(server.post("/api/v1/books/moon/sections"))
        .json(&json!({ "title": "Phases" }))
        .await
        .assert_status(StatusCode::CREATED);
    keyed(server.post("/api/v1/books/moon/texts"))
        .json(&json!({ "title": "Full", "parent": "phases" }))
        .await
        .assert_status(StatusCode::CREATED);
    (server, temp_dir)
}

#[tokio::test]
async fn test_health_check() {
    let (server, _temp_dir) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_requires_credentials() {
    let (server, _temp_dir) = create_test_server();

    let response = server.get("/api/v1/books").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.header(header::WWW_AUTHENTICATE),
        "Basic realm=\"mdbook\""
    );

    let response = server
        .get("/api/v1/books")
        .add_header(
            HeaderName::from_static("mdbook_apikey"),
            HeaderValue::from_static("wrong"),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_basic_credentials() {
    let (server, _temp_dir) = create_test_server();

    // admin:secret
    let response = server
        .get("/api/v1/state")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic YWRtaW46c2VjcmV0"),
        )
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["type"], "site");
    assert!(body["books"]["references"].is_object());
}

#[tokio::test]
async fn test_list_books_empty() {
    let (server, _temp_dir) = create_test_server();

    let response = keyed(server.get("/api/v1/books")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["books"], json!([]));
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_create_and_get_book() {
    let (server, _temp_dir) = server_with_book().await;

    let response = keyed(server.get("/api/v1/books"))
        .add_query_param("search", "moo")
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["books"][0]["bid"], "moon");

    let response = keyed(server.get("/api/v1/books/moon")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "Moon");
    assert_eq!(body["items"][0]["path"], "phases");
    assert_eq!(body["items"][0]["items"][0]["heading"], "1.1. Full");

    // Same name again
    keyed(server.post("/api/v1/books"))
        .json(&json!({ "title": "Moon" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_book_not_found() {
    let (server, _temp_dir) = create_test_server();

    let response = keyed(server.get("/api/v1/books/nowhere")).await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"], "Book error: No such book 'nowhere'");
}

#[tokio::test]
async fn test_update_item() {
    let (server, _temp_dir) = server_with_book().await;

    let response = keyed(server.put("/api/v1/books/moon/items/phases/full"))
        .json(&json!({ "content": "Bright as the [#Sun].", "status": "revised" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["content"], "Bright as the [#Sun].");
    assert_eq!(body["status"], "revised");
    assert_eq!(body["fulltitle"], "Phases; Full");

    let response = keyed(server.get("/api/v1/books/moon/index")).await;
    let body: Value = response.json();
    assert_eq!(body["entries"][0]["term"], "Sun");
    assert_eq!(body["entries"][0]["locations"][0]["path"], "phases/full");

    keyed(server.put("/api/v1/books/moon/items/phases/full"))
        .json(&json!({ "status": "shiny" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_move_and_copy() {
    let (server, _temp_dir) = server_with_book().await;

    let response = keyed(server.post("/api/v1/books/moon/move/phases/full"))
        .json(&json!({ "direction": "outof" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["path"], "full");

    let response = keyed(server.post("/api/v1/books/moon/copy/full")).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["path"], "full_copy");
    assert_eq!(body["title"], "Full (copy)");

    let response = keyed(server.post("/api/v1/books/moon/to-section/full")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["type"], "section");
    assert_eq!(body["items"][0]["path"], "full/full");
}

#[tokio::test]
async fn test_delete_item_needs_force() {
    let (server, _temp_dir) = server_with_book().await;

    keyed(server.delete("/api/v1/books/moon/items/phases"))
        .await
        .assert_status(StatusCode::CONFLICT);

    keyed(server.delete("/api/v1/books/moon/items/phases"))
        .add_query_param("force", "true")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    keyed(server.get("/api/v1/books/moon/items/phases"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_search() {
    let (server, _temp_dir) = server_with_book().await;
    keyed(server.put("/api/v1/books/moon/items/phases/full"))
        .json(&json!({ "content": "Tides follow the Moon." }))
        .await
        .assert_status_ok();

    let response = keyed(server.get("/api/v1/books/moon/search"))
        .add_query_param("term", "tides")
        .add_query_param("ignorecase", "true")
        .await;
    let body: Value = response.json();
    assert_eq!(body["hits"][0]["path"], "phases/full");
    assert_eq!(body["hits"][0]["heading"], "1.1. Full");

    keyed(server.get("/api/v1/books/moon/search"))
        .add_query_param("term", "(")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_references() {
    let (server, _temp_dir) = server_with_book().await;

    let response = keyed(server.post("/api/v1/references"))
        .json(&json!({
            "name": "Galilei 1610",
            "type": "book",
            "authors": ["Galilei, Galileo"],
            "title": "Sidereus Nuncius",
            "year": "1610"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], "galilei-1610");

    keyed(server.put("/api/v1/books/moon/items/phases/full"))
        .json(&json!({ "content": "Seen by [@Galilei 1610]." }))
        .await
        .assert_status_ok();

    let response = keyed(server.get("/api/v1/references/galilei-1610")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "Sidereus Nuncius");
    assert_eq!(
        body["citations"],
        json!([{ "bid": "moon", "path": "phases/full" }])
    );

    keyed(server.delete("/api/v1/references/galilei-1610"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    keyed(server.get("/api/v1/references/galilei-1610"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_download() {
    let (server, _temp_dir) = server_with_book().await;

    let response = keyed(server.get("/api/v1/books/moon/download"))
        .add_query_param("format", "docx")
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert!(response.as_bytes().starts_with(b"PK"));

    let response = keyed(server.get("/api/v1/books/moon/download"))
        .add_query_param("format", "pdf")
        .add_query_param("item", "phases/full")
        .await;
    response.assert_status_ok();
    let disposition = response.header(header::CONTENT_DISPOSITION);
    assert!(disposition
        .to_str()
        .unwrap()
        .contains("filename=\"moon-phases-full.typ\""));
    assert!(response.text().contains("1.1. Full"));
}

#[tokio::test]
async fn test_download_errors() {
    let (server, _temp_dir) = server_with_book().await;

    keyed(server.get("/api/v1/books/moon/download"))
        .add_query_param("format", "epub")
        .await
        .assert_status_bad_request();

    keyed(server.get("/api/v1/books/moon/download"))
        .add_query_param("item", "missing")
        .await
        .assert_status_not_found();

    keyed(server.get("/api/v1/books/sun/download"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_archive_and_delete_book() {
    let (server, _temp_dir) = server_with_book().await;

    let response = keyed(server.get("/api/v1/books/moon/archive")).await;
    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "application/zip");

    keyed(server.delete("/api/v1/books/moon"))
        .await
        .assert_status(StatusCode::CONFLICT);
    keyed(server.delete("/api/v1/books/moon"))
        .add_query_param("force", "true")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    keyed(server.get("/api/v1/books/moon"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_copy_and_reload_book() {
    let (server, temp_dir) = server_with_book().await;

    let response = keyed(server.post("/api/v1/books/moon/copy"))
        .add_query_param("owner", "ada")
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let copy = body["bid"].as_str().unwrap().to_string();
    assert_ne!(copy, "moon");
    assert_eq!(body["owner"], "ada");

    std::fs::write(temp_dir.path().join("moon").join("extra.md"), "Added by hand.").unwrap();
    let response = keyed(server.post("/api/v1/books/moon/reload")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["items"][1]["path"], "extra");
}
