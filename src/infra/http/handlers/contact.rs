//! Contact form endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::contact::{ContactError, ContactSubmission};
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Client address as seen through the reverse proxy. Falls back to a
/// shared bucket when no forwarding header is present.
fn remote_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<ContactSubmission>,
) -> Response {
    let ip = remote_ip(&headers);

    match state.contact.submit(&ip, submission).await {
        Ok(_) => Json(ContactResponse {
            success: true,
            message: "Your message has been received.",
        })
        .into_response(),
        Err(ContactError::RateLimited { retry_after_secs }) => {
            ApiError::rate_limited(retry_after_secs)
        }
        Err(error @ ContactError::Invalid { .. }) => {
            ApiError::invalid_input("Invalid contact submission", Some(error.to_string()))
                .into_response()
        }
        Err(ContactError::Store(error)) => {
            ApiError::store_unavailable(Some(error.to_string())).into_response()
        }
    }
}
