// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP ingest surface.
//!
//! A thin axum router over the ingest pipeline and the store's query
//! methods. Connection management, authentication and load shedding are the
//! deployment's concern; this surface only makes the tracker reachable.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/locations` | Ingest one location report |
//! | `GET /api/sources/{source_id}/history` | Live ledger, newest first |
//! | `GET /api/status` | Aggregate counters |
//! | `GET /healthz` | Store connectivity probe |
//!
//! Errors are mapped so callers can tell fix-the-request (422) from
//! retry-later (503).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::geo::GeoPoint;
use crate::ingest::IngestPipeline;
use crate::persistence::{LocationRecord, StoreStatus, TelemetryStore};

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ingest pipeline serving `POST /api/locations`.
    pub pipeline: Arc<IngestPipeline>,
    /// The store serving the query routes.
    pub store: Arc<dyn TelemetryStore>,
}

/// Build the tracker router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/locations", post(report_location))
        .route("/api/sources/{source_id}/history", get(source_history))
        .route("/api/status", get(status))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Body of `POST /api/locations`.
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// Reporting source identity. Positive.
    pub source_id: i64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Speed in metres per second.
    pub speed_mps: f64,
}

/// Response of `POST /api/locations`.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// The reporting source.
    pub source_id: i64,
    /// Observation time assigned to the committed record.
    pub event_timestamp: DateTime<Utc>,
    /// Incursion alerts queued by this report.
    pub incursions: usize,
    /// Records migrated to the archive by this report.
    pub migrated: u64,
}

async fn report_location(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let outcome = state
        .pipeline
        .report(
            req.source_id,
            GeoPoint::new(req.longitude, req.latitude),
            req.speed_mps,
        )
        .await?;

    Ok(Json(ReportResponse {
        source_id: outcome.record.source_id,
        event_timestamp: outcome.record.event_timestamp,
        incursions: outcome.incursions.len(),
        migrated: outcome.migrated,
    }))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<i64>,
}

async fn source_history(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<LocationRecord>>, ApiError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 1000);
    let records = state.store.live_history(source_id, limit).await?;
    Ok(Json(records))
}

async fn status(State(state): State<AppState>) -> Result<Json<StoreStatus>, ApiError> {
    Ok(Json(state.store.status().await?))
}

async fn healthz(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state.store.health_check().await?;
    Ok("ok")
}

/// Wrapper mapping tracker errors onto HTTP responses.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!(error = %self.0, "Request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "retryable": self.0.is_retryable(),
        }));
        (status, body).into_response()
    }
}
