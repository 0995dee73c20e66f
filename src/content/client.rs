//! Content store client.
//!
//! Wraps query access to the external headless store behind the
//! [`ContentStore`] seam, layering the tag-aware query cache on top. The
//! client is built once at startup and injected into every service; it is
//! never ambient global state.
//!
//! Degradation contract: a client without store configuration answers every
//! fetch with [`Fetched::Empty`]; a store failure answers with
//! [`Fetched::Unavailable`]. Neither propagates an error to the caller, so
//! pages keep rendering with whatever the variant collapses to.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheTag, QueryCache, QueryKey, TtlTier};

const SOURCE: &str = "content::client";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store responded with status {status}")]
    Status { status: StatusCode },
    #[error("store response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store write requires an API token")]
    MissingToken,
}

/// Query seam to the external store. Production uses [`HttpContentStore`];
/// tests substitute an in-memory double.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Run a read query with named parameters, returning the raw result.
    async fn query(&self, query: &str, params: &Value) -> Result<Value, StoreError>;

    /// Create a document in the store (contact messages).
    async fn create(&self, document: Value) -> Result<(), StoreError>;
}

/// Connection parameters for the store's HTTP query API.
#[derive(Debug, Clone)]
pub struct StoreConnection {
    pub endpoint: String,
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// HTTP implementation of [`ContentStore`].
///
/// Reads go to `GET {endpoint}/v{version}/data/query/{dataset}` with the
/// query string and `$`-prefixed JSON-encoded params; writes go to
/// `POST {endpoint}/v{version}/data/mutate/{dataset}`.
pub struct HttpContentStore {
    http: reqwest::Client,
    connection: StoreConnection,
}

impl HttpContentStore {
    pub fn new(connection: StoreConnection) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(connection.timeout)
            .build()?;
        Ok(Self { http, connection })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/v{}/data/query/{}",
            self.connection.endpoint.trim_end_matches('/'),
            self.connection.api_version,
            self.connection.dataset
        )
    }

    fn mutate_url(&self) -> String {
        format!(
            "{}/v{}/data/mutate/{}",
            self.connection.endpoint.trim_end_matches('/'),
            self.connection.api_version,
            self.connection.dataset
        )
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn query(&self, query: &str, params: &Value) -> Result<Value, StoreError> {
        let mut request = self.http.get(self.query_url()).query(&[("query", query)]);

        if let Some(map) = params.as_object() {
            for (name, value) in map {
                request = request.query(&[(format!("${name}"), value.to_string())]);
            }
        }

        if let Some(token) = self.connection.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { status });
        }

        let envelope: Value = response.json().await?;
        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn create(&self, document: Value) -> Result<(), StoreError> {
        let token = self
            .connection
            .token
            .as_deref()
            .ok_or(StoreError::MissingToken)?;

        let body = serde_json::json!({ "mutations": [{ "create": document }] });
        let response = self
            .http
            .post(self.mutate_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { status });
        }
        Ok(())
    }
}

/// Outcome of a content fetch.
///
/// `Empty` and `Unavailable` are distinguishable on purpose: the original
/// behavior collapsed both into empty data, which hides an unreachable
/// store behind "no content". Callers that want the original rendering
/// behavior use [`Fetched::or_default`]; callers that want a degraded-state
/// banner can match on `Unavailable`.
#[derive(Debug, Clone)]
pub enum Fetched<T> {
    Ok(T),
    /// The client has no store configuration; a valid non-error state.
    Empty,
    /// The store was reachable in principle but the fetch failed.
    Unavailable(String),
}

impl<T> Fetched<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Empty | Self::Unavailable(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Ok(value) => Fetched::Ok(f(value)),
            Self::Empty => Fetched::Empty,
            Self::Unavailable(reason) => Fetched::Unavailable(reason),
        }
    }
}

impl<T: Default> Fetched<T> {
    /// Collapse to the empty-collection fallback the site renders with.
    pub fn or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

/// One cached store fetch: query, params, the tags to label the entry with
/// and the TTL tier governing its deadline.
pub struct FetchRequest<'a> {
    pub query: &'a str,
    pub params: Value,
    pub tags: Vec<CacheTag>,
    pub ttl: TtlTier,
}

impl<'a> FetchRequest<'a> {
    pub fn new(query: &'a str, params: Value, tags: Vec<CacheTag>, ttl: TtlTier) -> Self {
        Self {
            query,
            params,
            tags,
            ttl,
        }
    }
}

/// Cached, degrading facade over the store.
pub struct ContentClient {
    store: Option<Arc<dyn ContentStore>>,
    cache: Arc<QueryCache>,
}

impl ContentClient {
    pub fn new(store: Arc<dyn ContentStore>, cache: Arc<QueryCache>) -> Self {
        Self {
            store: Some(store),
            cache,
        }
    }

    /// Client without store configuration: every fetch is `Empty`.
    pub fn disabled(cache: Arc<QueryCache>) -> Self {
        Self { store: None, cache }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Fetch through the query cache.
    ///
    /// A fresh cache entry short-circuits the store; a miss queries the
    /// store and labels the stored payload with the request's tags.
    pub async fn fetch<T: DeserializeOwned>(&self, request: FetchRequest<'_>) -> Fetched<T> {
        let Some(store) = self.store.as_ref() else {
            warn!(
                target = SOURCE,
                "store is not configured, returning empty result"
            );
            return Fetched::Empty;
        };

        let key = QueryKey::new(request.query, &request.params);
        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_value::<T>(cached) {
                Ok(value) => return Fetched::Ok(value),
                Err(error) => {
                    // Shape drift between deployments; treat as a miss.
                    debug!(target = SOURCE, %error, "cached payload no longer decodes, refetching");
                }
            }
        }

        match store.query(request.query, &request.params).await {
            Ok(payload) => {
                let tags: HashSet<CacheTag> = request.tags.into_iter().collect();
                self.cache
                    .insert(key, payload.clone(), tags, request.ttl.duration());
                match serde_json::from_value::<T>(payload) {
                    Ok(value) => Fetched::Ok(value),
                    Err(error) => {
                        warn!(target = SOURCE, %error, "store payload could not be decoded");
                        Fetched::Unavailable(error.to_string())
                    }
                }
            }
            Err(error) => {
                warn!(target = SOURCE, %error, "store fetch failed, degrading to empty");
                Fetched::Unavailable(error.to_string())
            }
        }
    }

    /// Fetch bypassing the cache (health probes).
    pub async fn fetch_uncached<T: DeserializeOwned>(
        &self,
        query: &str,
        params: Value,
    ) -> Fetched<T> {
        let Some(store) = self.store.as_ref() else {
            return Fetched::Empty;
        };
        match store.query(query, &params).await {
            Ok(payload) => match serde_json::from_value::<T>(payload) {
                Ok(value) => Fetched::Ok(value),
                Err(error) => Fetched::Unavailable(error.to_string()),
            },
            Err(error) => Fetched::Unavailable(error.to_string()),
        }
    }

    /// Create a document in the store. Unlike reads this surfaces the
    /// error; the caller decides whether a failed write is fatal.
    pub async fn create_document(&self, document: Value) -> Result<bool, StoreError> {
        match self.store.as_ref() {
            Some(store) => {
                store.create(document).await?;
                Ok(true)
            }
            None => {
                warn!(
                    target = SOURCE,
                    "store is not configured, document not persisted"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::cache::CacheLimits;
    use crate::domain::types::ContentKind;

    struct CountingStore {
        payload: Value,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(payload: Value) -> Self {
            Self {
                payload,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContentStore for CountingStore {
        async fn query(&self, _query: &str, _params: &Value) -> Result<Value, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }

        async fn create(&self, _document: Value) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ContentStore for FailingStore {
        async fn query(&self, _query: &str, _params: &Value) -> Result<Value, StoreError> {
            Err(StoreError::Status {
                status: StatusCode::BAD_GATEWAY,
            })
        }

        async fn create(&self, _document: Value) -> Result<(), StoreError> {
            Err(StoreError::MissingToken)
        }
    }

    fn cache() -> Arc<QueryCache> {
        Arc::new(QueryCache::new(&CacheLimits::default()))
    }

    fn request(query: &str) -> FetchRequest<'_> {
        FetchRequest::new(
            query,
            json!({}),
            vec![CacheTag::collection(ContentKind::Post)],
            TtlTier::Medium,
        )
    }

    #[tokio::test]
    async fn unconfigured_client_returns_empty_without_error() {
        let client = ContentClient::disabled(cache());
        let fetched: Fetched<Vec<String>> = client.fetch(request("q")).await;
        assert!(matches!(fetched, Fetched::Empty));
        assert!(fetched.or_default().is_empty());
    }

    #[tokio::test]
    async fn store_failure_degrades_to_unavailable() {
        let client = ContentClient::new(Arc::new(FailingStore), cache());
        let fetched: Fetched<Vec<String>> = client.fetch(request("q")).await;
        assert!(fetched.is_unavailable());
        assert!(fetched.or_default().is_empty());
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let store = Arc::new(CountingStore::new(json!(["a", "b"])));
        let client = ContentClient::new(store.clone(), cache());

        let first: Fetched<Vec<String>> = client.fetch(request("q")).await;
        let second: Fetched<Vec<String>> = client.fetch(request("q")).await;

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tag_invalidation_forces_refetch() {
        let store = Arc::new(CountingStore::new(json!(["a"])));
        let query_cache = cache();
        let client = ContentClient::new(store.clone(), query_cache.clone());

        let _: Fetched<Vec<String>> = client.fetch(request("q")).await;
        query_cache.invalidate_tag(&CacheTag::collection(ContentKind::Post));
        let _: Fetched<Vec<String>> = client.fetch(request("q")).await;

        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn null_payload_is_ok_none_for_optional_targets() {
        let store = Arc::new(CountingStore::new(Value::Null));
        let client = ContentClient::new(store, cache());

        let fetched: Fetched<Option<String>> = client.fetch(request("q")).await;
        match fetched {
            Fetched::Ok(value) => assert!(value.is_none()),
            other => panic!("expected Ok(None), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_document_without_store_is_not_persisted() {
        let client = ContentClient::disabled(cache());
        let persisted = client.create_document(json!({"_type": "contactMessage"})).await;
        assert!(matches!(persisted, Ok(false)));
    }
}
