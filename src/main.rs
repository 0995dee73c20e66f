use std::{process, sync::Arc, time::Duration};

use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

use vetrina::{
    application::{
        contact::{ContactService, Notifier, RateLimiter},
        error::AppError,
        pages::PageService,
        posts::PostService,
        projects::ProjectService,
        revalidate::RevalidationService,
        search::SearchService,
        site::SiteService,
    },
    cache::{CacheLimits, PageCache, QueryCache},
    config,
    content::{ContentClient, HttpContentStore, StoreConnection},
    infra::{
        email::EmailNotifier,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let state = build_state(&settings)?;
    serve_http(&settings, state).await
}

fn build_state(settings: &config::Settings) -> Result<AppState, AppError> {
    let limits = CacheLimits {
        query_entries: settings.cache.query_entries.get() as usize,
        page_entries: settings.cache.page_entries.get() as usize,
    };
    let query_cache = Arc::new(QueryCache::new(&limits));
    let page_cache = Arc::new(PageCache::new(&limits));

    let content = match &settings.store.project_id {
        Some(project_id) => {
            let endpoint = match &settings.store.endpoint {
                Some(url) => url.to_string(),
                None => format!("https://{project_id}.api.sanity.io"),
            };
            let store = HttpContentStore::new(StoreConnection {
                endpoint,
                dataset: settings.store.dataset.clone(),
                api_version: settings.store.api_version.clone(),
                token: settings.store.token.clone(),
                timeout: settings.store.timeout,
            })
            .map_err(|err| AppError::unexpected(format!("failed to build store client: {err}")))?;
            Arc::new(ContentClient::new(Arc::new(store), query_cache.clone()))
        }
        None => {
            warn!("no store project id configured, content runs in disabled mode");
            Arc::new(ContentClient::disabled(query_cache.clone()))
        }
    };

    let posts = Arc::new(PostService::new(content.clone()));
    let projects = Arc::new(ProjectService::new(content.clone()));
    let pages = Arc::new(PageService::new(content.clone()));
    let site = Arc::new(SiteService::new(content.clone()));
    let search = Arc::new(SearchService::new(posts.clone(), projects.clone()));

    let revalidation = Arc::new(RevalidationService::new(
        settings.revalidate.secret.clone(),
        query_cache.clone(),
        page_cache.clone(),
    ));
    if settings.revalidate.secret.is_none() {
        warn!("no revalidation secret configured, webhooks will be rejected");
    }

    let notifier: Option<Arc<dyn Notifier>> = if settings.contact.email_enabled() {
        let notifier = EmailNotifier::new(
            settings.contact.email_endpoint.as_ref().map(|u| u.to_string()),
            settings.contact.email_api_key.clone().unwrap_or_default(),
            settings.contact.email_from.clone().unwrap_or_default(),
            settings.contact.email_recipient.clone().unwrap_or_default(),
        )
        .map_err(|err| AppError::unexpected(format!("failed to build email client: {err}")))?;
        Some(Arc::new(notifier))
    } else {
        None
    };

    let limiter = RateLimiter::new(
        settings.contact.window,
        settings.contact.max_requests.get(),
    );
    let contact = Arc::new(ContactService::new(content.clone(), notifier, limiter));

    Ok(AppState {
        content,
        posts,
        projects,
        pages,
        site,
        search,
        revalidation,
        contact,
        page_cache,
    })
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let graceful_shutdown = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => error!(error = %err, "failed to install sigterm handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(grace_secs = grace.as_secs(), "shutdown signal received");
}
