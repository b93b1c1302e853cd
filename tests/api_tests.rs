//! API integration tests
//!
//! Requests go straight into the router with `oneshot`; no socket is bound.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::Fixture;
use royalbit_roster::api::router;
use royalbit_roster::api::server::{ApiConfig, AppState};
use royalbit_roster::config::RosterConfig;
use royalbit_roster::RosterService;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(fixture: &Fixture) -> Router {
    let config = RosterConfig::load(&fixture.config_path()).unwrap();
    let service = Arc::new(RosterService::from_config(config));
    router(Arc::new(AppState::new(service)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIG AND INFO
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_config_default() {
    let config = ApiConfig::default();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let fixture = Fixture::new();
    let (status, body) = get(app(&fixture), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let paths: Vec<&str> = body["data"]["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["path"].as_str())
        .collect();
    assert!(paths.contains(&"/api/v1/schedule"));
    assert!(paths.contains(&"/api/v1/cache"));
}

#[tokio::test]
async fn test_health_and_version() {
    let fixture = Fixture::new();
    let (_, health) = get(app(&fixture), "/health").await;
    assert_eq!(health["data"]["status"], "healthy");

    let (_, version) = get(app(&fixture), "/version").await;
    assert_eq!(version["data"]["version"], env!("CARGO_PKG_VERSION"));
    assert!(version["request_id"].as_str().is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// SCHEDULES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_schedule_with_analysis() {
    let fixture = Fixture::new();
    let (status, body) = post(
        app(&fixture),
        "/api/v1/schedule",
        json!({
            "name": "Ким Анна Сергеевна",
            "month": "июль",
            "division": "support",
            "analyze": true
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["month"], "ИЮЛЬ");
    assert_eq!(data["days"][0]["label"], "1(Пн)");
    assert_eq!(data["days"][0]["text"], "09:00-18:00");
    assert_eq!(data["days"].as_array().unwrap().len(), 3);
    assert_eq!(data["analysis"]["vacation"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_schedule_month_by_number_without_analysis() {
    let fixture = Fixture::new();
    let (_, body) = post(
        app(&fixture),
        "/api/v1/schedule",
        json!({"name": "Ким Анна Сергеевна", "month": "8", "division": "support"}),
    )
    .await;
    assert_eq!(body["data"]["month"], "АВГУСТ");
    assert!(body["data"].get("analysis").is_none());
}

#[tokio::test]
async fn test_schedule_unknown_person_is_empty_success() {
    let fixture = Fixture::new();
    let (_, body) = post(
        app(&fixture),
        "/api/v1/schedule",
        json!({"name": "Нет Такого Человека", "month": "июль", "division": "support"}),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["days"], json!([]));
}

#[tokio::test]
async fn test_schedule_bad_month() {
    let fixture = Fixture::new();
    let (_, body) = post(
        app(&fixture),
        "/api/v1/schedule",
        json!({"name": "Ким Анна Сергеевна", "month": "смарч", "division": "support"}),
    )
    .await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Unknown month"));
}

#[tokio::test]
async fn test_unknown_division_is_unavailable() {
    let fixture = Fixture::new();
    let (_, body) = post(
        app(&fixture),
        "/api/v1/duties",
        json!({"date": "2024-07-01", "division": "sales"}),
    )
    .await;
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("schedule unavailable:"));
}

// ═══════════════════════════════════════════════════════════════════════════
// ROSTERS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_duties() {
    let fixture = Fixture::new();
    let (_, body) = post(
        app(&fixture),
        "/api/v1/duties",
        json!({"date": "2024-07-01", "division": "support"}),
    )
    .await;
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["role"], "senior");
    assert_eq!(entries[0]["time"], "09:00-21:00");
    assert_eq!(entries[1]["category"], "work");
}

#[tokio::test]
async fn test_duties_month() {
    let fixture = Fixture::new();
    let (_, body) = post(
        app(&fixture),
        "/api/v1/duties/month",
        json!({"date": "2024-07-20", "division": "support"}),
    )
    .await;
    let days = body["data"]["days"].as_object().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days["2"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_heads_and_group() {
    let fixture = Fixture::new();
    let (_, heads) = post(
        app(&fixture),
        "/api/v1/heads",
        json!({"date": "2024-07-02", "division": "support"}),
    )
    .await;
    assert_eq!(heads["data"]["entries"][0]["name"], "Белов Борис Борисович");

    let (_, group) = post(
        app(&fixture),
        "/api/v1/group",
        json!({"head": "Орлова Ольга Олеговна", "date": "2024-07-01", "division": "support"}),
    )
    .await;
    let members = group["data"]["entries"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1]["category"], "day_off");
}

#[tokio::test]
async fn test_malformed_date_is_rejected() {
    let fixture = Fixture::new();
    let (status, _) = post(
        app(&fixture),
        "/api/v1/heads",
        json!({"date": "01.07.2024", "division": "support"}),
    )
    .await;
    assert!(status.is_client_error());
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_cache_stats_and_invalidate() {
    let fixture = Fixture::new();
    let app = app(&fixture);

    post(
        app.clone(),
        "/api/v1/duties",
        json!({"date": "2024-07-01", "division": "support"}),
    )
    .await;
    let (_, stats) = get(app.clone(), "/api/v1/cache").await;
    assert_eq!(stats["data"]["loads"], 1);
    assert_eq!(stats["data"]["entries"], 1);

    let duty = fixture.path("duty.xlsx");
    let (_, invalidated) = post(
        app.clone(),
        "/api/v1/invalidate",
        json!({"path": duty.to_string_lossy()}),
    )
    .await;
    assert_eq!(invalidated["data"]["removed"], 1);

    let (_, stats) = get(app, "/api/v1/cache").await;
    assert_eq!(stats["data"]["entries"], 0);
}
