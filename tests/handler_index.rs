mod common;

use axum::Router;
use axum_test::TestServer;
use common::StubGeminiClient;
use gemini_proxy::web;
use std::sync::Arc;

fn server() -> TestServer {
    let state = common::create_test_state(Arc::new(StubGeminiClient::new()));
    let app = Router::new()
        .merge(web::routes::public_routes())
        .with_state(state);

    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_index_page() {
    let response = server().get("/").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("action=\"/__go__\""));
    assert!(html.contains("name=\"url\""));
}

#[tokio::test]
async fn test_go_redirects_to_proxy_path() {
    let response = server()
        .get("/__go__")
        .add_query_param("url", "gemini://example.org/docs/")
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/example.org/docs/");
}

#[tokio::test]
async fn test_go_accepts_missing_scheme() {
    let response = server()
        .get("/__go__")
        .add_query_param("url", "example.org")
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/example.org/");
}

#[tokio::test]
async fn test_go_rejects_web_urls() {
    let response = server()
        .get("/__go__")
        .add_query_param("url", "https://example.org/")
        .await;

    assert_eq!(response.status_code(), 400);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
}
