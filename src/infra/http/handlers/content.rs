//! Public content endpoints for posts, projects, and pages.
//!
//! List and detail responses are written through the path-keyed page
//! cache so webhook path invalidation takes effect on the next request.
//! Only unfiltered default-pagination list responses are cached; filtered
//! variants go straight to the services.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::search::{DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::cache::CachedPage;
use crate::content::Fetched;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).max(1)
    }

    /// Filtered or paginated variants bypass the page cache.
    fn is_default(&self) -> bool {
        self.category.is_none()
            && !self.featured
            && self.page() == DEFAULT_PAGE
            && self.limit() == DEFAULT_LIMIT
    }
}

#[derive(Debug, Serialize)]
struct ListResponse<T> {
    success: bool,
    data: Vec<T>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
struct Pagination {
    page: u32,
    limit: u32,
    total: usize,
    #[serde(rename = "totalPages")]
    total_pages: usize,
    #[serde(rename = "hasNext")]
    has_next: bool,
    #[serde(rename = "hasPrevious")]
    has_previous: bool,
}

#[derive(Debug, Serialize)]
struct DetailResponse<T> {
    success: bool,
    data: T,
}

fn paginated_response<T: Serialize>(records: Vec<T>, page: u32, limit: u32) -> ListResponse<T> {
    let total = records.len();
    let start = ((page - 1) as usize).saturating_mul(limit as usize);
    let end = start.saturating_add(limit as usize).min(total);
    let data: Vec<T> = if start < total {
        records.into_iter().skip(start).take(limit as usize).collect()
    } else {
        Vec::new()
    };
    let total_pages = total.div_ceil(limit as usize);

    ListResponse {
        success: true,
        data,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
            has_next: end < total,
            has_previous: page > 1,
        },
    }
}

fn cached_response(page: CachedPage) -> Response {
    (
        StatusCode::from_u16(page.status).unwrap_or(StatusCode::OK),
        [(header::CONTENT_TYPE, page.content_type)],
        page.body,
    )
        .into_response()
}

/// Serialize a response body and store it under the given page path.
fn write_through(state: &AppState, path: &str, status: StatusCode, body: &impl Serialize) {
    if let Ok(bytes) = serde_json::to_vec(body) {
        state.page_cache.insert(
            path,
            CachedPage {
                status: status.as_u16(),
                content_type: "application/json".to_string(),
                body: bytes.into(),
            },
        );
    }
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let cacheable = params.is_default();
    if cacheable
        && let Some(page) = state.page_cache.get("/blog")
    {
        return cached_response(page);
    }

    let fetched = if params.featured {
        state.posts.featured_posts(params.limit()).await
    } else if let Some(category) = &params.category {
        state.posts.posts_by_category(category).await
    } else {
        state.posts.all_posts().await
    };

    let records = match fetched {
        Fetched::Ok(records) => records,
        Fetched::Empty => Vec::new(),
        Fetched::Unavailable(reason) => {
            return ApiError::store_unavailable(Some(reason)).into_response();
        }
    };

    let body = paginated_response(records, params.page(), params.limit());
    if cacheable {
        write_through(&state, "/blog", StatusCode::OK, &body);
    }
    Json(body).into_response()
}

pub async fn get_post(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let path = format!("/blog/{slug}");
    if let Some(page) = state.page_cache.get(&path) {
        return cached_response(page);
    }

    match state.posts.post_by_slug(&slug).await {
        Fetched::Ok(Some(post)) => {
            let body = DetailResponse {
                success: true,
                data: post,
            };
            write_through(&state, &path, StatusCode::OK, &body);
            Json(body).into_response()
        }
        Fetched::Ok(None) | Fetched::Empty => {
            ApiError::not_found("Post not found").into_response()
        }
        Fetched::Unavailable(reason) => ApiError::store_unavailable(Some(reason)).into_response(),
    }
}

pub async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let cacheable = params.is_default();
    if cacheable
        && let Some(page) = state.page_cache.get("/projects")
    {
        return cached_response(page);
    }

    let fetched = if params.featured {
        state.projects.featured_projects().await
    } else {
        state.projects.all_projects().await
    };

    let records = match fetched {
        Fetched::Ok(records) => records,
        Fetched::Empty => Vec::new(),
        Fetched::Unavailable(reason) => {
            return ApiError::store_unavailable(Some(reason)).into_response();
        }
    };

    let body = paginated_response(records, params.page(), params.limit());
    if cacheable {
        write_through(&state, "/projects", StatusCode::OK, &body);
    }
    Json(body).into_response()
}

pub async fn get_project(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let path = format!("/projects/{slug}");
    if let Some(page) = state.page_cache.get(&path) {
        return cached_response(page);
    }

    match state.projects.project_by_slug(&slug).await {
        Fetched::Ok(Some(project)) => {
            let body = DetailResponse {
                success: true,
                data: project,
            };
            write_through(&state, &path, StatusCode::OK, &body);
            Json(body).into_response()
        }
        Fetched::Ok(None) | Fetched::Empty => {
            ApiError::not_found("Project not found").into_response()
        }
        Fetched::Unavailable(reason) => ApiError::store_unavailable(Some(reason)).into_response(),
    }
}

/// Site settings, exposed for clients that render chrome from it.
pub async fn get_settings(State(state): State<AppState>) -> Response {
    match state.site.settings().await {
        Fetched::Ok(Some(settings)) => Json(DetailResponse {
            success: true,
            data: settings,
        })
        .into_response(),
        Fetched::Ok(None) | Fetched::Empty => Json(DetailResponse {
            success: true,
            data: Value::Null,
        })
        .into_response(),
        Fetched::Unavailable(reason) => ApiError::store_unavailable(Some(reason)).into_response(),
    }
}

pub async fn get_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let path = format!("/{slug}");
    if let Some(page) = state.page_cache.get(&path) {
        return cached_response(page);
    }

    match state.pages.page_by_slug(&slug).await {
        Fetched::Ok(Some(record)) => {
            let body = DetailResponse {
                success: true,
                data: record,
            };
            write_through(&state, &path, StatusCode::OK, &body);
            Json(body).into_response()
        }
        Fetched::Ok(None) | Fetched::Empty => {
            ApiError::not_found("Page not found").into_response()
        }
        Fetched::Unavailable(reason) => ApiError::store_unavailable(Some(reason)).into_response(),
    }
}
