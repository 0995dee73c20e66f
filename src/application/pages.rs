//! Free-form page data access.

use std::sync::Arc;

use serde_json::json;

use crate::cache::{CacheTag, TtlTier};
use crate::content::{ContentClient, FetchRequest, Fetched, queries};
use crate::domain::entities::PageRecord;
use crate::domain::types::ContentKind;

pub struct PageService {
    client: Arc<ContentClient>,
}

impl PageService {
    pub fn new(client: Arc<ContentClient>) -> Self {
        Self { client }
    }

    pub async fn page_by_slug(&self, slug: &str) -> Fetched<Option<PageRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::PAGE_BY_SLUG,
                json!({ "slug": slug }),
                vec![
                    CacheTag::collection(ContentKind::Page),
                    CacheTag::entity(ContentKind::Page, slug),
                ],
                TtlTier::Low,
            ))
            .await
    }
}
