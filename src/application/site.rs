//! Site settings singleton access.

use std::sync::Arc;

use serde_json::json;

use crate::cache::{CacheTag, TtlTier};
use crate::content::{ContentClient, FetchRequest, Fetched, queries};
use crate::domain::entities::SiteSettingsRecord;
use crate::domain::types::ContentKind;

pub struct SiteService {
    client: Arc<ContentClient>,
}

impl SiteService {
    pub fn new(client: Arc<ContentClient>) -> Self {
        Self { client }
    }

    /// The settings document changes rarely but feeds every layout, so it
    /// sits in the high-frequency tier.
    pub async fn settings(&self) -> Fetched<Option<SiteSettingsRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::SITE_SETTINGS,
                json!({}),
                vec![CacheTag::collection(ContentKind::Settings)],
                TtlTier::High,
            ))
            .await
    }
}
