//! Health endpoint backed by a live store probe.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::content::{Fetched, queries};
use crate::infra::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub services: Services,
    #[serde(rename = "responseTime")]
    pub response_time_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct Services {
    pub store: ServiceHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    #[serde(rename = "responseTime")]
    pub response_time_ms: u128,
}

pub async fn health(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    let probe_started = Instant::now();
    let probe: Fetched<u64> = state
        .content
        .fetch_uncached(queries::POST_COUNT, json!({}))
        .await;
    let probe_elapsed = probe_started.elapsed().as_millis();

    // A disabled store is not a failure; there is simply nothing to probe.
    let store_healthy = !probe.is_unavailable();
    let overall = if store_healthy { "healthy" } else { "degraded" };
    let status = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: overall,
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        version: env!("CARGO_PKG_VERSION"),
        services: Services {
            store: ServiceHealth {
                status: if store_healthy { "healthy" } else { "unhealthy" },
                response_time_ms: probe_elapsed,
            },
        },
        response_time_ms: started.elapsed().as_millis(),
    };

    (status, Json(body)).into_response()
}
