//! Revalidation webhook endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::OffsetDateTime;

use crate::application::revalidate::{RejectReason, SIGNATURE_HEADER};
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct RevalidateResponse {
    pub message: String,
    /// Milliseconds since the Unix epoch, matching the webhook sender's
    /// timestamp resolution.
    pub now: i64,
}

pub async fn revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state.revalidation.handle(&body, signature) {
        Ok(processed) => {
            let slug = processed
                .slug
                .map(|s| format!(" ({s})"))
                .unwrap_or_default();
            let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
            Json(RevalidateResponse {
                message: format!("Revalidated {}{slug}", processed.document_type),
                now,
            })
            .into_response()
        }
        Err(RejectReason::MissingSecret) => {
            ApiError::misconfigured("Revalidation secret is not configured").into_response()
        }
        Err(RejectReason::InvalidSignature) => {
            ApiError::unauthorized("Invalid signature").into_response()
        }
        Err(RejectReason::MalformedPayload(reason)) => {
            ApiError::invalid_input("Malformed webhook payload", Some(reason)).into_response()
        }
    }
}
