//! HTTP capabilities against local fake upstreams

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::json;

use privy::{Capability, CapabilityError};
use privy_adapters::tools::{DadJokeTool, SearchTool, WeatherTool};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn assert_failed(result: Result<String, CapabilityError>, tool: &str) {
    match result {
        Err(CapabilityError::Failed { capability, .. }) => assert_eq!(capability, tool),
        other => panic!("expected {} failure, got {:?}", tool, other),
    }
}

// ============================================
// Search
// ============================================

async fn searxng(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    seen.lock().unwrap().push(params);
    Json(json!({
        "query": "rust",
        "results": [
            {"title": "Rust 1.90 released", "url": "https://blog.rust-lang.org", "content": "The Rust team\nis happy"},
            {"title": "Second", "url": "https://example.com/2"},
            {"title": "Third", "url": "https://example.com/3", "content": "three"}
        ]
    }))
}

#[tokio::test]
async fn test_search_queries_searxng_json_api() {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let base = serve(
        Router::new()
            .route("/search", get(searxng))
            .route("/down", get(|| async { StatusCode::BAD_GATEWAY }))
            .route("/garbage", get(|| async { "<html>not json</html>" }))
            .with_state(seen.clone()),
    )
    .await;

    let tool = SearchTool::new(Client::new(), format!("{}/search", base), 2);
    let out = tool.invoke("latest rust release").await.unwrap();

    assert!(out.starts_with("--- SEARCH RESULTS ---\n1. Rust 1.90 released"));
    assert!(out.contains("   Snippet: The Rust team is happy"));
    assert!(out.contains("2. Second\n   URL: https://example.com/2\n   Snippet: No content available."));
    assert!(!out.contains("Third"));

    let params = seen.lock().unwrap()[0].clone();
    assert_eq!(params["q"], "latest rust release");
    assert_eq!(params["format"], "json");
    assert_eq!(params["language"], "en");

    let down = SearchTool::new(Client::new(), format!("{}/down", base), 2);
    assert_failed(down.invoke("x").await, "search_tool");

    let garbage = SearchTool::new(Client::new(), format!("{}/garbage", base), 2);
    assert_failed(garbage.invoke("x").await, "search_tool");
}

// ============================================
// Weather
// ============================================

async fn wttr(Path(location): Path<String>, Query(params): Query<HashMap<String, String>>) -> String {
    assert_eq!(params["format"], "%l: %c %t %w %h");
    format!("{}: ☀️ +18°C ↗11km/h 60%\n", location)
}

#[tokio::test]
async fn test_weather_reports_one_line() {
    let base = serve(
        Router::new()
            .route("/ok/:location", get(wttr))
            .route("/empty/:location", get(|| async { "  \n" }))
            .route("/down/:location", get(|| async { StatusCode::SERVICE_UNAVAILABLE })),
    )
    .await;

    let tool = WeatherTool::new(Client::new(), format!("{}/ok", base));
    assert_eq!(
        tool.invoke("what's the weather in New York?").await.unwrap(),
        "New York: ☀️ +18°C ↗11km/h 60%"
    );

    let empty = WeatherTool::new(Client::new(), format!("{}/empty", base));
    match empty.invoke("London").await {
        Err(CapabilityError::Failed { message, .. }) => assert!(message.contains("empty response")),
        other => panic!("unexpected {:?}", other),
    }

    let down = WeatherTool::new(Client::new(), format!("{}/down", base));
    assert_failed(down.invoke("London").await, "weather_tool");
}

// ============================================
// Dad joke
// ============================================

async fn joke(headers: HeaderMap) -> String {
    assert_eq!(headers[header::ACCEPT], "text/plain");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    "I'm reading a book on anti-gravity. It's impossible to put down.\n".to_string()
}

#[tokio::test]
async fn test_dad_joke_fetches_plain_text() {
    let base = serve(
        Router::new()
            .route("/joke", get(joke))
            .route("/blank", get(|| async { "" }))
            .route("/down", get(|| async { StatusCode::INTERNAL_SERVER_ERROR })),
    )
    .await;

    let tool = DadJokeTool::new(Client::new(), format!("{}/joke", base));
    assert_eq!(
        tool.invoke("").await.unwrap(),
        "I'm reading a book on anti-gravity. It's impossible to put down."
    );

    let blank = DadJokeTool::new(Client::new(), format!("{}/blank", base));
    assert_eq!(
        blank.invoke("").await.unwrap(),
        "Could not fetch a joke at this time."
    );

    let down = DadJokeTool::new(Client::new(), format!("{}/down", base));
    match down.invoke("").await {
        Err(CapabilityError::Failed { message, .. }) => assert!(message.starts_with("Error fetching joke")),
        other => panic!("unexpected {:?}", other),
    }
}
