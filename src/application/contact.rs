//! Contact form intake.
//!
//! Submissions pass a honeypot check, a per-IP rate limit, and field
//! validation before the message is persisted to the content store. Email
//! notification is best effort; a failed send never fails the request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::content::{ContentClient, StoreError};

const SOURCE: &str = "application::contact";

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    /// Honeypot field, hidden in the form. Humans leave it empty.
    #[serde(default)]
    pub website: String,
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("invalid field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to persist message: {0}")]
    Store(#[from] StoreError),
}

/// What the caller should tell the client. A discarded bot submission is
/// indistinguishable from an accepted one on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Accepted,
    Discarded,
}

/// Outbound notification seam; the production impl posts to an HTTP email
/// API, tests swap in a recorder.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &ContactSubmission) -> Result<(), NotifyError>;
}

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Sliding-window per-key limiter. Timestamps inside the window are kept
/// per key and pruned on each check.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let window = self.window;

        let mut entry = self.buckets.entry(key.to_string()).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        if entry.len() as u32 >= self.max_requests {
            return false;
        }
        entry.push(now);
        true
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }
}

pub struct ContactService {
    client: Arc<ContentClient>,
    notifier: Option<Arc<dyn Notifier>>,
    limiter: RateLimiter,
}

impl ContactService {
    pub fn new(
        client: Arc<ContentClient>,
        notifier: Option<Arc<dyn Notifier>>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            client,
            notifier,
            limiter,
        }
    }

    pub async fn submit(
        &self,
        remote_ip: &str,
        submission: ContactSubmission,
    ) -> Result<ContactOutcome, ContactError> {
        if !submission.website.is_empty() {
            counter!("vetrina_contact_honeypot_total").increment(1);
            info!(target = SOURCE, "honeypot tripped, discarding submission");
            return Ok(ContactOutcome::Discarded);
        }

        if !self.limiter.allow(remote_ip) {
            counter!("vetrina_contact_rate_limited_total").increment(1);
            return Err(ContactError::RateLimited {
                retry_after_secs: self.limiter.retry_after_secs(),
            });
        }

        validate(&submission)?;

        let submitted_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let persisted = self
            .client
            .create_document(json!({
                "_type": "contactMessage",
                "name": submission.name,
                "email": submission.email,
                "subject": submission.subject,
                "message": submission.message,
                "submittedAt": submitted_at,
                "read": false,
            }))
            .await?;

        if let Some(notifier) = &self.notifier {
            if let Err(error) = notifier.notify(&submission).await {
                warn!(target = SOURCE, %error, "email notification failed");
            }
        }

        counter!("vetrina_contact_accepted_total").increment(1);
        info!(target = SOURCE, persisted, "contact message accepted");
        Ok(ContactOutcome::Accepted)
    }
}

fn validate(submission: &ContactSubmission) -> Result<(), ContactError> {
    let required = [
        ("name", &submission.name),
        ("email", &submission.email),
        ("subject", &submission.subject),
        ("message", &submission.message),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ContactError::Invalid {
                field,
                reason: "must not be empty",
            });
        }
    }

    if !looks_like_email(&submission.email) {
        return Err(ContactError::Invalid {
            field: "email",
            reason: "must be a valid email address",
        });
    }
    if submission.name.len() > MAX_NAME_LEN {
        return Err(ContactError::Invalid {
            field: "name",
            reason: "too long",
        });
    }
    if submission.subject.len() > MAX_SUBJECT_LEN {
        return Err(ContactError::Invalid {
            field: "subject",
            reason: "too long",
        });
    }
    if submission.message.len() > MAX_MESSAGE_LEN {
        return Err(ContactError::Invalid {
            field: "message",
            reason: "too long",
        });
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::cache::{CacheLimits, QueryCache};
    use crate::content::ContentStore;

    struct RecordingStore {
        created: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl ContentStore for RecordingStore {
        async fn query(&self, _query: &str, _params: &Value) -> Result<Value, StoreError> {
            Ok(Value::Null)
        }

        async fn create(&self, document: Value) -> Result<(), StoreError> {
            self.created.lock().unwrap().push(document);
            Ok(())
        }
    }

    struct RecordingNotifier {
        sent: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, _submission: &ContactSubmission) -> Result<(), NotifyError> {
            *self.sent.lock().unwrap() += 1;
            if self.fail {
                Err(NotifyError("smtp down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "I enjoyed your post.".to_string(),
            website: String::new(),
        }
    }

    fn service_with(
        store: Arc<RecordingStore>,
        notifier: Option<Arc<dyn Notifier>>,
        limiter: RateLimiter,
    ) -> ContactService {
        let cache = Arc::new(QueryCache::new(&CacheLimits::default()));
        let client = Arc::new(ContentClient::new(store, cache));
        ContactService::new(client, notifier, limiter)
    }

    fn open_limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_secs(300), 5)
    }

    #[tokio::test]
    async fn valid_submission_is_persisted() {
        let store = Arc::new(RecordingStore {
            created: Mutex::new(Vec::new()),
        });
        let service = service_with(store.clone(), None, open_limiter());

        let outcome = service.submit("1.2.3.4", submission()).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Accepted);

        let created = store.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["_type"], "contactMessage");
        assert_eq!(created[0]["email"], "ada@example.com");
        assert_eq!(created[0]["read"], false);
    }

    #[tokio::test]
    async fn honeypot_discards_without_store_write() {
        let store = Arc::new(RecordingStore {
            created: Mutex::new(Vec::new()),
        });
        let service = service_with(store.clone(), None, open_limiter());

        let mut bot = submission();
        bot.website = "https://spam.example".to_string();

        let outcome = service.submit("1.2.3.4", bot).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Discarded);
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sixth_request_in_window_is_limited() {
        let store = Arc::new(RecordingStore {
            created: Mutex::new(Vec::new()),
        });
        let service = service_with(store.clone(), None, open_limiter());

        for _ in 0..5 {
            service.submit("9.9.9.9", submission()).await.unwrap();
        }
        let result = service.submit("9.9.9.9", submission()).await;
        assert!(matches!(result, Err(ContactError::RateLimited { .. })));

        // A different address is unaffected.
        service.submit("8.8.8.8", submission()).await.unwrap();
    }

    #[tokio::test]
    async fn missing_field_is_rejected() {
        let store = Arc::new(RecordingStore {
            created: Mutex::new(Vec::new()),
        });
        let service = service_with(store.clone(), None, open_limiter());

        let mut incomplete = submission();
        incomplete.message = "   ".to_string();

        let result = service.submit("1.2.3.4", incomplete).await;
        assert!(matches!(
            result,
            Err(ContactError::Invalid {
                field: "message",
                ..
            })
        ));
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_email_is_rejected() {
        let store = Arc::new(RecordingStore {
            created: Mutex::new(Vec::new()),
        });
        let service = service_with(store, None, open_limiter());

        for bad in ["adaexample.com", "ada@", "@example.com", "a b@example.com", "ada@nodot"] {
            let mut s = submission();
            s.email = bad.to_string();
            let result = service.submit("1.2.3.4", s).await;
            assert!(
                matches!(result, Err(ContactError::Invalid { field: "email", .. })),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_submission() {
        let store = Arc::new(RecordingStore {
            created: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(RecordingNotifier {
            sent: Mutex::new(0),
            fail: true,
        });
        let service = service_with(store.clone(), Some(notifier.clone()), open_limiter());

        let outcome = service.submit("1.2.3.4", submission()).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Accepted);
        assert_eq!(*notifier.sent.lock().unwrap(), 1);
        assert_eq!(store.created.lock().unwrap().len(), 1);
    }
}
