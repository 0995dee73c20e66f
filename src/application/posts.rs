//! Post data access.
//!
//! Each function pins a fixed query, a fixed tag set, and a fixed TTL tier.
//! Collection listings revalidate every 6 hours; a single post holds for 24
//! hours but additionally carries its entity tag so one webhook edit drops
//! exactly that post.

use std::sync::Arc;

use serde_json::json;

use crate::cache::{CacheTag, TtlTier};
use crate::content::{ContentClient, FetchRequest, Fetched, queries};
use crate::domain::entities::PostRecord;
use crate::domain::types::ContentKind;

pub struct PostService {
    client: Arc<ContentClient>,
}

impl PostService {
    pub fn new(client: Arc<ContentClient>) -> Self {
        Self { client }
    }

    pub async fn all_posts(&self) -> Fetched<Vec<PostRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::ALL_POSTS,
                json!({}),
                vec![CacheTag::collection(ContentKind::Post)],
                TtlTier::Medium,
            ))
            .await
    }

    pub async fn featured_posts(&self, limit: u32) -> Fetched<Vec<PostRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::FEATURED_POSTS,
                json!({ "limit": limit }),
                vec![CacheTag::collection(ContentKind::Post)],
                TtlTier::Medium,
            ))
            .await
    }

    pub async fn post_by_slug(&self, slug: &str) -> Fetched<Option<PostRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::POST_BY_SLUG,
                json!({ "slug": slug }),
                vec![
                    CacheTag::collection(ContentKind::Post),
                    CacheTag::entity(ContentKind::Post, slug),
                ],
                TtlTier::Low,
            ))
            .await
    }

    pub async fn post_slugs(&self) -> Fetched<Vec<String>> {
        self.client
            .fetch(FetchRequest::new(
                queries::POST_SLUGS,
                json!({}),
                vec![CacheTag::collection(ContentKind::Post)],
                TtlTier::Medium,
            ))
            .await
    }

    pub async fn posts_by_category(&self, category: &str) -> Fetched<Vec<PostRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::POSTS_BY_CATEGORY,
                json!({ "category": category }),
                vec![
                    CacheTag::collection(ContentKind::Post),
                    CacheTag::collection(ContentKind::Category),
                ],
                TtlTier::Medium,
            ))
            .await
    }

    pub async fn related_posts(&self, slug: &str, limit: u32) -> Fetched<Vec<PostRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::RELATED_POSTS,
                json!({ "slug": slug, "limit": limit }),
                vec![CacheTag::collection(ContentKind::Post)],
                TtlTier::Medium,
            ))
            .await
    }
}
