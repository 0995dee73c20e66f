//! Search endpoint.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::application::search::{DEFAULT_LIMIT, DEFAULT_PAGE, SearchRequest};
use crate::domain::entities::{PostRecord, ProjectRecord};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: SearchData,
    pub query: String,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchData {
    pub posts: Vec<PostRecord>,
    pub projects: Vec<ProjectRecord>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let request = SearchRequest::new(
        params.q.unwrap_or_default().trim(),
        params.page.unwrap_or(DEFAULT_PAGE),
        params.limit.unwrap_or(DEFAULT_LIMIT),
    );

    let results = state.search.search(&request).await;

    Json(SearchResponse {
        success: true,
        data: SearchData {
            posts: results.posts,
            projects: results.projects,
        },
        query: request.query,
        page: request.page,
        limit: request.limit,
        total: results.total,
        degraded: results.degraded,
    })
}
