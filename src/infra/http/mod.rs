pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use state::AppState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use middleware::{log_responses, set_request_context};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/search", get(handlers::search::search))
        .route("/api/revalidate", post(handlers::revalidate::revalidate))
        .route("/api/contact", post(handlers::contact::submit))
        .route("/api/blog", get(handlers::content::list_posts))
        .route("/api/blog/{slug}", get(handlers::content::get_post))
        .route("/api/projects", get(handlers::content::list_projects))
        .route("/api/projects/{slug}", get(handlers::content::get_project))
        .route("/api/pages/{slug}", get(handlers::content::get_page))
        .route("/api/settings", get(handlers::content::get_settings))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/chat/clear", post(handlers::chat::clear))
        .route(
            "/api/playground/execute",
            get(handlers::playground::execute_info).post(handlers::playground::execute),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
