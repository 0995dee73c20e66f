//! Code playground simulator. Nothing is executed; responses are canned
//! per language for demo purposes.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

const DEMO_OUTPUTS: &[(&str, &str)] = &[
    ("python", "Hello, World!\nExecution time: 0.023s\nMemory used: 2.4 MB"),
    ("javascript", "Hello, World!\nExecution time: 0.015s\nMemory used: 1.8 MB"),
    (
        "typescript",
        "Hello, World!\nCompiled successfully\nExecution time: 0.031s\nMemory used: 3.2 MB",
    ),
    (
        "java",
        "Hello, World!\nCompiled: Main.java\nExecution time: 0.125s\nMemory used: 15.4 MB",
    ),
    ("cpp", "Hello, World!\nCompiled: main.cpp\nExecution time: 0.008s\nMemory used: 1.2 MB"),
    ("c", "Hello, World!\nCompiled: main.c\nExecution time: 0.007s\nMemory used: 0.9 MB"),
    ("go", "Hello, World!\nExecution time: 0.012s\nMemory used: 2.1 MB"),
    (
        "rust",
        "Hello, World!\nCompiled successfully\nExecution time: 0.009s\nMemory used: 1.5 MB",
    ),
];

fn simulated_output(language: &str) -> &'static str {
    let lowered = language.to_lowercase();
    DEMO_OUTPUTS
        .iter()
        .find(|(id, _)| *id == lowered)
        .map(|(_, output)| *output)
        .unwrap_or("Code executed successfully")
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: &'static str,
    pub execution_time: u64,
    pub memory_used: u64,
}

pub async fn execute(
    State(_state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Response {
    if request.code.trim().is_empty() {
        return ApiError::bad_request("Code is required").into_response();
    }
    if request.language.trim().is_empty() {
        return ApiError::bad_request("Language is required").into_response();
    }

    Json(ExecuteResponse {
        success: true,
        output: simulated_output(request.language.trim()),
        execution_time: 0,
        memory_used: 1,
    })
    .into_response()
}

/// Metadata for the execute endpoint, mirroring the demo disclaimer.
pub async fn execute_info(State(_state): State<AppState>) -> impl IntoResponse {
    let languages: Vec<&str> = DEMO_OUTPUTS.iter().map(|(id, _)| *id).collect();
    Json(json!({
        "message": "Code playground execution API",
        "warning": "Demo endpoint; real code execution requires sandboxing.",
        "supported_languages": languages,
        "methods": ["POST"],
    }))
}
