//! API request handlers
//!
//! Handlers for all REST API endpoints. Hard failures (unreadable files,
//! unknown divisions) answer `success: false`; lookups that find nothing
//! answer `success: true` with empty data.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analyzer::{analyze_schedule, ScheduleAnalysis};
use crate::cache::CacheStats;
use crate::error::RosterError;
use crate::header::Month;
use crate::types::{RosterEntry, ScheduleDay};

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }

    /// Generic "schedule unavailable" failure for a hard error.
    pub fn unavailable(error: RosterError) -> Self {
        Self::err(format!("schedule unavailable: {}", error))
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Roster API Server".to_string(),
        version: state.version.clone(),
        description: "Schedule and duty-roster queries over cached spreadsheets".to_string(),
        endpoints: vec![
            endpoint("/health", "GET", "Health check endpoint"),
            endpoint("/version", "GET", "Get server version"),
            endpoint("/api/v1/schedule", "POST", "A person's schedule for a month"),
            endpoint("/api/v1/duties", "POST", "Duties for a date"),
            endpoint("/api/v1/duties/month", "POST", "Duties for every day of a month"),
            endpoint("/api/v1/heads", "POST", "Heads working on a date"),
            endpoint("/api/v1/group", "POST", "Members of a head's group"),
            endpoint("/api/v1/invalidate", "POST", "Drop cached sheets of a replaced file"),
            endpoint("/api/v1/cache", "GET", "Cache counters"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: ["schedule", "duties", "heads", "group", "invalidate", "cache"]
            .iter()
            .map(|f| f.to_string())
            .collect(),
    }))
}

//==============================================================================
// Schedules
//==============================================================================

/// Schedule request
#[derive(Deserialize)]
pub struct ScheduleRequest {
    pub name: String,
    /// Month name or number
    pub month: String,
    pub division: String,
    #[serde(default)]
    pub analyze: bool,
}

/// Schedule response
#[derive(Serialize)]
pub struct ScheduleResponse {
    pub name: String,
    pub month: Month,
    pub division: String,
    pub days: Vec<ScheduleDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ScheduleAnalysis>,
}

/// POST /api/v1/schedule - A person's schedule for a month
pub async fn schedule(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScheduleRequest>,
) -> Json<ApiResponse<ScheduleResponse>> {
    let month: Month = match req.month.parse() {
        Ok(m) => m,
        Err(e) => return Json(ApiResponse::err(e)),
    };

    match state
        .service
        .get_user_schedule(&req.name, month, &req.division)
        .await
    {
        Ok(schedule) => {
            let analysis = req.analyze.then(|| analyze_schedule(&schedule));
            Json(ApiResponse::ok(ScheduleResponse {
                name: req.name,
                month,
                division: req.division,
                days: schedule.days,
                analysis,
            }))
        }
        Err(e) => Json(ApiResponse::unavailable(e)),
    }
}

//==============================================================================
// Rosters
//==============================================================================

/// Date-scoped roster request
#[derive(Deserialize)]
pub struct RosterRequest {
    pub date: NaiveDate,
    pub division: String,
}

/// Roster response
#[derive(Serialize)]
pub struct RosterResponse {
    pub date: NaiveDate,
    pub division: String,
    pub entries: Vec<RosterEntry>,
}

/// Month roster response
#[derive(Serialize)]
pub struct MonthRosterResponse {
    pub date: NaiveDate,
    pub division: String,
    pub days: BTreeMap<u8, Vec<RosterEntry>>,
}

/// POST /api/v1/duties - Duties for a date
pub async fn duties(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RosterRequest>,
) -> Json<ApiResponse<RosterResponse>> {
    match state
        .service
        .get_duties_for_date(req.date, &req.division)
        .await
    {
        Ok(entries) => Json(ApiResponse::ok(RosterResponse {
            date: req.date,
            division: req.division,
            entries,
        })),
        Err(e) => Json(ApiResponse::unavailable(e)),
    }
}

/// POST /api/v1/duties/month - Duties for every day of the date's month
pub async fn duties_month(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RosterRequest>,
) -> Json<ApiResponse<MonthRosterResponse>> {
    match state
        .service
        .get_duties_for_month(req.date, &req.division)
        .await
    {
        Ok(days) => Json(ApiResponse::ok(MonthRosterResponse {
            date: req.date,
            division: req.division,
            days,
        })),
        Err(e) => Json(ApiResponse::unavailable(e)),
    }
}

/// POST /api/v1/heads - Heads working on a date
pub async fn heads(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RosterRequest>,
) -> Json<ApiResponse<RosterResponse>> {
    match state
        .service
        .get_heads_for_date(req.date, &req.division)
        .await
    {
        Ok(entries) => Json(ApiResponse::ok(RosterResponse {
            date: req.date,
            division: req.division,
            entries,
        })),
        Err(e) => Json(ApiResponse::unavailable(e)),
    }
}

/// Group request
#[derive(Deserialize)]
pub struct GroupRequest {
    pub head: String,
    pub date: NaiveDate,
    pub division: String,
}

/// POST /api/v1/group - Members of a head's group
pub async fn group(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GroupRequest>,
) -> Json<ApiResponse<RosterResponse>> {
    match state
        .service
        .get_group_members(&req.head, req.date, &req.division)
        .await
    {
        Ok(entries) => Json(ApiResponse::ok(RosterResponse {
            date: req.date,
            division: req.division,
            entries,
        })),
        Err(e) => Json(ApiResponse::unavailable(e)),
    }
}

//==============================================================================
// Cache
//==============================================================================

/// Invalidate request
#[derive(Deserialize)]
pub struct InvalidateRequest {
    pub path: String,
}

/// Invalidate response
#[derive(Serialize)]
pub struct InvalidateResponse {
    pub path: String,
    pub removed: usize,
}

/// POST /api/v1/invalidate - Drop cached sheets of a replaced file
pub async fn invalidate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InvalidateRequest>,
) -> Json<ApiResponse<InvalidateResponse>> {
    let removed = state.service.invalidate(&PathBuf::from(&req.path));
    Json(ApiResponse::ok(InvalidateResponse {
        path: req.path,
        removed,
    }))
}

/// GET /api/v1/cache - Cache counters
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::ok(state.service.cache().stats()))
}
