//! Shared fixtures for router-level tests: an in-memory store double and
//! a fully wired application state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use vetrina::application::contact::{ContactService, RateLimiter};
use vetrina::application::pages::PageService;
use vetrina::application::posts::PostService;
use vetrina::application::projects::ProjectService;
use vetrina::application::revalidate::{RevalidationService, SIGNATURE_HEADER, sign_body};
use vetrina::application::search::SearchService;
use vetrina::application::site::SiteService;
use vetrina::cache::{CacheLimits, PageCache, QueryCache};
use vetrina::content::{ContentClient, ContentStore, StoreError, queries};
use vetrina::infra::http::{AppState, build_router};

pub const WEBHOOK_SECRET: &str = "integration-secret";

/// In-memory store double answering the projection queries from fixtures.
pub struct ScriptedStore {
    posts: Value,
    projects: Value,
    pages: Value,
    pub failing: AtomicBool,
    pub query_calls: AtomicUsize,
    pub created: std::sync::Mutex<Vec<Value>>,
}

impl ScriptedStore {
    pub fn new(posts: Value, projects: Value) -> Self {
        Self {
            posts,
            projects,
            pages: json!([]),
            failing: AtomicBool::new(false),
            query_calls: AtomicUsize::new(0),
            created: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_pages(mut self, pages: Value) -> Self {
        self.pages = pages;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn by_slug(collection: &Value, slug: &str) -> Value {
        collection
            .as_array()
            .and_then(|records| {
                records
                    .iter()
                    .find(|record| {
                        record["slug"]["current"] == slug || record["slug"] == slug
                    })
                    .cloned()
            })
            .unwrap_or(Value::Null)
    }
}

#[async_trait]
impl ContentStore for ScriptedStore {
    async fn query(&self, query: &str, params: &Value) -> Result<Value, StoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }

        let slug = params["slug"].as_str().unwrap_or_default();
        let result = match query {
            q if q == queries::ALL_POSTS || q == queries::FEATURED_POSTS => self.posts.clone(),
            q if q == queries::ALL_PROJECTS || q == queries::FEATURED_PROJECTS => {
                self.projects.clone()
            }
            q if q == queries::POST_BY_SLUG => Self::by_slug(&self.posts, slug),
            q if q == queries::PROJECT_BY_SLUG => Self::by_slug(&self.projects, slug),
            q if q == queries::PAGE_BY_SLUG => Self::by_slug(&self.pages, slug),
            q if q == queries::POST_COUNT => {
                json!(self.posts.as_array().map(Vec::len).unwrap_or(0))
            }
            _ => Value::Null,
        };
        Ok(result)
    }

    async fn create(&self, document: Value) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        self.created.lock().unwrap().push(document);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<ScriptedStore>,
    pub query_cache: Arc<QueryCache>,
    pub page_cache: Arc<PageCache>,
}

impl TestApp {
    pub fn new(store: ScriptedStore) -> Self {
        let store = Arc::new(store);
        let query_cache = Arc::new(QueryCache::new(&CacheLimits::default()));
        let page_cache = Arc::new(PageCache::new(&CacheLimits::default()));

        let content = Arc::new(ContentClient::new(store.clone(), query_cache.clone()));
        let posts = Arc::new(PostService::new(content.clone()));
        let projects = Arc::new(ProjectService::new(content.clone()));

        let state = AppState {
            content: content.clone(),
            posts: posts.clone(),
            projects: projects.clone(),
            pages: Arc::new(PageService::new(content.clone())),
            site: Arc::new(SiteService::new(content.clone())),
            search: Arc::new(SearchService::new(posts, projects)),
            revalidation: Arc::new(RevalidationService::new(
                Some(WEBHOOK_SECRET.to_string()),
                query_cache.clone(),
                page_cache.clone(),
            )),
            contact: Arc::new(ContactService::new(
                content,
                None,
                RateLimiter::new(Duration::from_secs(300), 5),
            )),
            page_cache: page_cache.clone(),
        };

        Self {
            router: build_router(state),
            store,
            query_cache,
            page_cache,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn post_webhook(&self, payload: &Value, signature: Option<&str>) -> Response<Body> {
        let body = payload.to_string();
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/revalidate")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        let request = builder.body(Body::from(body)).expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub fn sign(&self, payload: &Value) -> String {
        sign_body(WEBHOOK_SECRET, 1_700_000_000_000, payload.to_string().as_bytes())
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn sample_posts() -> Value {
    json!([
        {
            "_id": "post-1",
            "title": "Rust async patterns",
            "slug": { "current": "rust-async-patterns" },
            "excerpt": "Streams, pinning, and executors.",
            "bodyText": "A long walk through async rust.",
            "publishedAt": "2026-03-10T08:00:00Z",
            "categories": ["Rust", "Async"]
        },
        {
            "_id": "post-2",
            "title": "Caching strategies",
            "slug": { "current": "caching-strategies" },
            "excerpt": "Tags, TTLs, and invalidation.",
            "bodyText": "Why cache invalidation is hard.",
            "publishedAt": "2026-01-05T10:30:00Z",
            "categories": ["Web"]
        },
        {
            "_id": "post-3",
            "title": "Older draft notes",
            "slug": { "current": "older-draft-notes" },
            "excerpt": "Assorted notes.",
            "categories": []
        }
    ])
}

pub fn sample_projects() -> Value {
    json!([
        {
            "_id": "project-1",
            "title": "Vetrina",
            "slug": { "current": "vetrina" },
            "description": "Portfolio backend with tag-aware caching.",
            "technologies": ["Rust", "axum"],
            "featured": true,
            "order": 1
        },
        {
            "_id": "project-2",
            "title": "Terminal dashboard",
            "slug": { "current": "terminal-dashboard" },
            "description": "A TUI metrics viewer.",
            "technologies": ["Rust"],
            "featured": false,
            "order": 2
        }
    ])
}
