use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Json, Router};
use common::QuoteState;
use elevate::clock::FixedClock;
use elevate::database::{Store, MIGRATIONS, SCHEMA_VERSION};
use elevate::quotes_api::{QuoteSource, QuotesApiError, ZenQuotesClient};
use elevate::App;
use serde_json::json;

/// Serves `router` on a random local port and returns the API base URL.
async fn spawn_quote_service(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/", addr)
}

fn quotes_router() -> Router {
    Router::new().route(
        "/api/quotes/",
        get(|| async {
            Json(json!([
                { "q": "Well begun is half done.", "a": "Aristotle", "h": "<blockquote/>" },
                { "q": "Second quote.", "a": "Nobody", "h": "<blockquote/>" }
            ]))
        }),
    )
}

fn client(base_url: &str, timeout: Duration) -> ZenQuotesClient {
    ZenQuotesClient::new(base_url, timeout).unwrap()
}

#[tokio::test]
async fn test_client_parses_quote_batch() {
    let base_url = spawn_quote_service(quotes_router()).await;

    let quotes = client(&base_url, Duration::from_secs(5))
        .fetch_quotes()
        .await
        .unwrap();

    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0].quote, "Well begun is half done.");
    assert_eq!(quotes[0].author, "Aristotle");
}

#[tokio::test]
async fn test_client_reports_error_status() {
    let router = Router::new().route(
        "/api/quotes/",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base_url = spawn_quote_service(router).await;

    let err = client(&base_url, Duration::from_secs(5))
        .fetch_quotes()
        .await
        .unwrap_err();

    assert!(matches!(err, QuotesApiError::Status(500)));
}

#[tokio::test]
async fn test_client_rejects_malformed_payload() {
    let router = Router::new().route("/api/quotes/", get(|| async { "definitely not json" }));
    let base_url = spawn_quote_service(router).await;

    let err = client(&base_url, Duration::from_secs(5))
        .fetch_quotes()
        .await
        .unwrap_err();

    assert!(matches!(err, QuotesApiError::Http(_)));
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_client_gives_up_after_timeout() {
    let router = Router::new().route(
        "/api/quotes/",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([]))
        }),
    );
    let base_url = spawn_quote_service(router).await;

    let err = client(&base_url, Duration::from_millis(100))
        .fetch_quotes()
        .await
        .unwrap_err();

    match err {
        QuotesApiError::Http(e) => assert!(e.is_timeout()),
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_home_screen_loads_quote_from_service() {
    let base_url = spawn_quote_service(quotes_router()).await;
    let store = Store::open_in_memory(SCHEMA_VERSION, MIGRATIONS).await.unwrap();
    let app = App::assemble(
        store,
        Arc::new(FixedClock::on(2025, 1, 1).unwrap()),
        Arc::new(client(&base_url, Duration::from_secs(5))),
    );

    app.quotes.fetch_random_quote().await;

    assert_eq!(
        app.quotes.quote_state(),
        QuoteState::Loaded {
            quote: "Well begun is half done.".to_string(),
            author: "Aristotle".to_string(),
        }
    );
    assert!(!app.quotes.is_favorite());
}

#[tokio::test]
async fn test_unreachable_service_ends_in_failed_state() {
    // Grab a free port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = Store::open_in_memory(SCHEMA_VERSION, MIGRATIONS).await.unwrap();
    let app = App::assemble(
        store,
        Arc::new(FixedClock::on(2025, 1, 1).unwrap()),
        Arc::new(client(&format!("http://{}/api/", addr), Duration::from_secs(5))),
    );

    app.quotes.fetch_random_quote().await;

    let state = app.quotes.quote_state();
    assert!(!state.is_loading());
    let message = state.error().expect("fetch should have failed");
    assert!(!message.is_empty());
}
