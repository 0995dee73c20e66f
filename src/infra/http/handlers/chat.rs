//! Chat placeholder endpoint, keyword lookup only.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

const DEFAULT_REPLY: &str =
    "Thanks for your message. I will get back to you as soon as possible.";

const RESPONSES: &[(&str, &str)] = &[
    ("hello", "Hello! How can I help you?"),
    ("hi", "Hi there! How can I assist you today?"),
    ("projects", "You can check all my projects on the projects page."),
    ("contact", "You can contact me through the contact page."),
    ("blog", "You can read my articles on the blog page."),
    ("portfolio", "The portfolio section showcases my best work."),
];

fn reply_for(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    RESPONSES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub data: ChatData,
}

#[derive(Debug, Serialize)]
pub struct ChatData {
    pub session_id: String,
    pub message: String,
    pub response: &'static str,
    pub timestamp: String,
}

pub async fn chat(State(_state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let message = request.message.trim();
    if message.is_empty() {
        return ApiError::bad_request("Message is required").into_response();
    }

    let session_id = request
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Json(ChatResponse {
        success: true,
        data: ChatData {
            session_id,
            message: message.to_string(),
            response: reply_for(message),
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        },
    })
    .into_response()
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: &'static str,
}

/// No server-side history is kept; clearing always succeeds.
pub async fn clear(State(_state): State<AppState>) -> impl IntoResponse {
    Json(ClearResponse {
        success: true,
        message: "Chat history cleared.",
    })
}
