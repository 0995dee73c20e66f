//! On-demand revalidation.
//!
//! The content store's change webhook lands here. A request moves through
//! three states: unverified (raw body + signature header), verified
//! (decoded payload), processed (tags and paths invalidated). Rejection at
//! any step leaves the caches untouched.
//!
//! Invalidation is synchronous within the request and not transactional:
//! once a tag is dropped it stays dropped even if a later step fails. The
//! webhook sender owns retries.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use metrics::counter;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{CacheTag, PageCache, QueryCache};
use crate::domain::types::{ContentKind, Slug};

const SOURCE: &str = "application::revalidate";

/// Header carrying the webhook signature, `t=<millis>,v1=<base64url sig>`.
pub const SIGNATURE_HEADER: &str = "vetrina-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RejectReason {
    /// Server side misconfiguration; maps to 500, the sender should retry
    /// once the secret is installed.
    #[error("revalidation secret is not configured")]
    MissingSecret,
    #[error("webhook signature is invalid")]
    InvalidSignature,
    #[error("webhook payload is malformed: {0}")]
    MalformedPayload(String),
}

/// Change notification body sent by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "_type")]
    pub document_type: String,
    #[serde(default)]
    pub slug: Option<Slug>,
}

/// Raw inbound webhook before signature verification.
pub struct UnverifiedWebhook<'a> {
    body: &'a [u8],
    signature: Option<&'a str>,
}

impl<'a> UnverifiedWebhook<'a> {
    pub fn new(body: &'a [u8], signature: Option<&'a str>) -> Self {
        Self { body, signature }
    }

    /// `unverified -> verified`, or `unverified -> rejected`.
    pub fn verify(self, secret: Option<&str>) -> Result<VerifiedWebhook, RejectReason> {
        let secret = secret.ok_or(RejectReason::MissingSecret)?;
        let signature = self.signature.ok_or(RejectReason::InvalidSignature)?;

        let (timestamp, provided) = parse_signature(signature)?;
        let expected = compute_signature(secret, timestamp, self.body);

        if expected.ct_eq(&provided).into() {
            let payload: WebhookPayload = serde_json::from_slice(self.body)
                .map_err(|err| RejectReason::MalformedPayload(err.to_string()))?;
            if payload.document_type.is_empty() {
                return Err(RejectReason::MalformedPayload(
                    "`_type` must not be empty".to_string(),
                ));
            }
            Ok(VerifiedWebhook { payload })
        } else {
            Err(RejectReason::InvalidSignature)
        }
    }
}

fn parse_signature(header: &str) -> Result<(u64, Vec<u8>), RejectReason> {
    let mut timestamp: Option<u64> = None;
    let mut signature: Option<Vec<u8>> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse().ok();
            }
            Some(("v1", value)) => {
                signature = URL_SAFE_NO_PAD.decode(value).ok();
            }
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(sig)) => Ok((t, sig)),
        _ => Err(RejectReason::InvalidSignature),
    }
}

fn compute_signature(secret: &str, timestamp: u64, body: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Signature-checked webhook; `verified -> processed` is the only
/// remaining transition.
#[derive(Debug)]
pub struct VerifiedWebhook {
    payload: WebhookPayload,
}

impl VerifiedWebhook {
    pub fn payload(&self) -> &WebhookPayload {
        &self.payload
    }

    /// Plan which tags and paths the change touches.
    pub fn plan(&self) -> InvalidationPlan {
        let slug = self.payload.slug.as_ref().map(Slug::as_str);

        match ContentKind::from_document_type(&self.payload.document_type) {
            Some(ContentKind::Post) => InvalidationPlan::for_entity(
                ContentKind::Post,
                "/blog",
                slug.map(|s| (format!("/blog/{s}"), s)),
            ),
            Some(ContentKind::Project) => InvalidationPlan::for_entity(
                ContentKind::Project,
                "/projects",
                slug.map(|s| (format!("/projects/{s}"), s)),
            ),
            Some(ContentKind::Page) => {
                let mut plan = InvalidationPlan {
                    tags: vec![CacheTag::collection(ContentKind::Page)],
                    paths: Vec::new(),
                };
                if let Some(s) = slug {
                    plan.tags.push(CacheTag::entity(ContentKind::Page, s));
                    plan.paths.push(format!("/{s}"));
                }
                plan
            }
            Some(ContentKind::Settings) => InvalidationPlan {
                tags: vec![CacheTag::collection(ContentKind::Settings)],
                paths: vec!["/".to_string()],
            },
            // Authors and categories are referenced from both collections.
            Some(ContentKind::Author) | Some(ContentKind::Category) => InvalidationPlan {
                tags: vec![
                    CacheTag::collection(ContentKind::Post),
                    CacheTag::collection(ContentKind::Project),
                ],
                paths: vec!["/blog".to_string(), "/projects".to_string()],
            },
            // Unknown types only refresh the homepage.
            None => InvalidationPlan {
                tags: Vec::new(),
                paths: vec!["/".to_string()],
            },
        }
    }
}

/// Tags and page paths one webhook invalidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub tags: Vec<CacheTag>,
    pub paths: Vec<String>,
}

impl InvalidationPlan {
    fn for_entity(
        kind: ContentKind,
        collection_path: &str,
        entity: Option<(String, &str)>,
    ) -> Self {
        let mut tags = vec![CacheTag::collection(kind)];
        let mut paths = vec![collection_path.to_string()];
        if let Some((path, slug)) = entity {
            tags.push(CacheTag::entity(kind, slug));
            paths.push(path);
        }
        Self { tags, paths }
    }
}

/// Summary of a processed webhook, echoed in the response body.
#[derive(Debug, Clone)]
pub struct ProcessedWebhook {
    pub document_type: String,
    pub slug: Option<String>,
    pub invalidated_tags: usize,
    pub invalidated_paths: usize,
}

pub struct RevalidationService {
    secret: Option<String>,
    query_cache: Arc<QueryCache>,
    page_cache: Arc<PageCache>,
}

impl RevalidationService {
    pub fn new(
        secret: Option<String>,
        query_cache: Arc<QueryCache>,
        page_cache: Arc<PageCache>,
    ) -> Self {
        Self {
            secret,
            query_cache,
            page_cache,
        }
    }

    /// Run the full state machine for one inbound webhook.
    pub fn handle(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<ProcessedWebhook, RejectReason> {
        let verified = match UnverifiedWebhook::new(body, signature).verify(self.secret.as_deref())
        {
            Ok(verified) => verified,
            Err(reason) => {
                counter!("vetrina_webhook_rejected_total").increment(1);
                warn!(target = SOURCE, %reason, "webhook rejected, no cache action taken");
                return Err(reason);
            }
        };

        let plan = verified.plan();
        let payload = verified.payload();

        for tag in &plan.tags {
            self.query_cache.invalidate_tag(tag);
        }
        for path in &plan.paths {
            self.page_cache.invalidate_path(path);
        }

        counter!("vetrina_webhook_processed_total").increment(1);
        info!(
            target = SOURCE,
            document_type = %payload.document_type,
            slug = payload.slug.as_ref().map(Slug::as_str).unwrap_or(""),
            tags = plan.tags.len(),
            paths = plan.paths.len(),
            "webhook processed"
        );

        Ok(ProcessedWebhook {
            document_type: payload.document_type.clone(),
            slug: payload.slug.as_ref().map(|s| s.as_str().to_string()),
            invalidated_tags: plan.tags.len(),
            invalidated_paths: plan.paths.len(),
        })
    }
}

/// Sign a body the way the store does. Shared with tests and the CLI docs.
pub fn sign_body(secret: &str, timestamp: u64, body: &[u8]) -> String {
    let signature = compute_signature(secret, timestamp, body);
    format!("t={timestamp},v1={}", URL_SAFE_NO_PAD.encode(signature))
}
