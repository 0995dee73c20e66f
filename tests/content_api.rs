mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::{ScriptedStore, TestApp, body_json, sample_posts, sample_projects};

fn app() -> TestApp {
    TestApp::new(ScriptedStore::new(sample_posts(), sample_projects()))
}

#[tokio::test]
async fn blog_list_returns_paginated_envelope() {
    let app = app();

    let response = app.get("/api/blog").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 1);
    assert_eq!(body["pagination"]["hasNext"], false);
    assert_eq!(body["pagination"]["hasPrevious"], false);
}

#[tokio::test]
async fn blog_list_pagination_slices() {
    let app = app();

    let body = body_json(app.get("/api/blog?page=2&limit=2").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["hasNext"], false);
    assert_eq!(body["pagination"]["hasPrevious"], true);
}

#[tokio::test]
async fn blog_list_survives_extreme_pagination_values() {
    let app = app();

    let response = app
        .get("/api/blog?page=4294967295&limit=4294967295")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["hasNext"], false);
}

#[tokio::test]
async fn default_blog_list_is_served_from_the_page_cache() {
    let app = app();

    assert_eq!(app.get("/api/blog").await.status(), StatusCode::OK);
    let calls = app
        .store
        .query_calls
        .load(std::sync::atomic::Ordering::SeqCst);

    // Second hit comes from the page cache without a store round trip.
    assert_eq!(app.get("/api/blog").await.status(), StatusCode::OK);
    assert_eq!(
        app.store
            .query_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        calls
    );

    // Filtered variants bypass the page cache (but may hit the query cache).
    assert!(!app.page_cache.contains("/blog?page=2"));
}

#[tokio::test]
async fn blog_detail_and_unknown_slug() {
    let app = app();

    let found = app.get("/api/blog/caching-strategies").await;
    assert_eq!(found.status(), StatusCode::OK);
    let body = body_json(found).await;
    assert_eq!(body["data"]["_id"], "post-2");
    assert_eq!(body["data"]["slug"], "caching-strategies");

    let missing = app.get("/api/blog/no-such-post").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = body_json(missing).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn project_detail_roundtrip() {
    let app = app();

    let response = app.get("/api/projects/vetrina").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["featured"], true);
    assert_eq!(body["data"]["technologies"][0], "Rust");
}

#[tokio::test]
async fn store_failure_maps_to_503() {
    let app = app();
    app.store.set_failing(true);

    let response = app.get("/api/blog").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "store_unavailable");
}

#[tokio::test]
async fn health_reports_store_status() {
    let app = app();

    let healthy = app.get("/api/health").await;
    assert_eq!(healthy.status(), StatusCode::OK);
    let body = body_json(healthy).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["store"]["status"], "healthy");

    app.store.set_failing(true);
    let degraded = app.get("/api/health").await;
    assert_eq!(degraded.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(degraded).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["store"]["status"], "unhealthy");
}

#[tokio::test]
async fn contact_submission_is_persisted() {
    let app = app();

    let response = app
        .post_json(
            "/api/contact",
            json!({
                "name": "Ada",
                "email": "ada@example.com",
                "subject": "Collaboration",
                "message": "I would like to work together."
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let created = app.store.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["_type"], "contactMessage");
}

#[tokio::test]
async fn contact_honeypot_returns_success_without_persisting() {
    let app = app();

    let response = app
        .post_json(
            "/api/contact",
            json!({
                "name": "Bot",
                "email": "bot@example.com",
                "subject": "Spam",
                "message": "Buy now",
                "website": "https://spam.example"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.store.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn contact_rate_limit_returns_429_with_retry_after() {
    let app = app();
    let payload = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "subject": "Hello",
        "message": "Again."
    });

    for _ in 0..5 {
        let ok = app.post_json("/api/contact", payload.clone()).await;
        assert_eq!(ok.status(), StatusCode::OK);
    }

    let limited = app.post_json("/api/contact", payload).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key("retry-after"));
    let body = body_json(limited).await;
    assert_eq!(body["error"]["code"], "rate_limited");
}

#[tokio::test]
async fn contact_missing_fields_are_400() {
    let app = app();

    let response = app
        .post_json(
            "/api/contact",
            json!({ "name": "Ada", "email": "ada@example.com" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_mints_a_session_and_answers_keywords() {
    let app = app();

    let response = app
        .post_json("/api/chat", json!({ "message": "tell me about your projects" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(!body["data"]["session_id"].as_str().unwrap().is_empty());
    assert!(
        body["data"]["response"]
            .as_str()
            .unwrap()
            .contains("projects page")
    );

    // An existing session id is echoed back.
    let response = app
        .post_json(
            "/api/chat",
            json!({ "message": "hello", "session_id": "abc-123" }),
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["session_id"], "abc-123");

    let empty = app.post_json("/api/chat", json!({ "message": "  " })).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn playground_simulates_execution() {
    let app = app();

    let response = app
        .post_json(
            "/api/playground/execute",
            json!({ "code": "println!(\"Hello\")", "language": "rust" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["output"].as_str().unwrap().starts_with("Hello, World!"));

    let missing_code = app
        .post_json("/api/playground/execute", json!({ "language": "rust" }))
        .await;
    assert_eq!(missing_code.status(), StatusCode::BAD_REQUEST);

    let info = app.get("/api/playground/execute").await;
    assert_eq!(info.status(), StatusCode::OK);
    let body = body_json(info).await;
    assert!(
        body["supported_languages"]
            .as_array()
            .unwrap()
            .iter()
            .any(|lang| lang == "rust")
    );
}
