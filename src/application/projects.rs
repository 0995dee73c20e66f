//! Project data access.

use std::sync::Arc;

use serde_json::json;

use crate::cache::{CacheTag, TtlTier};
use crate::content::{ContentClient, FetchRequest, Fetched, queries};
use crate::domain::entities::ProjectRecord;
use crate::domain::types::ContentKind;

pub struct ProjectService {
    client: Arc<ContentClient>,
}

impl ProjectService {
    pub fn new(client: Arc<ContentClient>) -> Self {
        Self { client }
    }

    pub async fn all_projects(&self) -> Fetched<Vec<ProjectRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::ALL_PROJECTS,
                json!({}),
                vec![CacheTag::collection(ContentKind::Project)],
                TtlTier::Medium,
            ))
            .await
    }

    pub async fn featured_projects(&self) -> Fetched<Vec<ProjectRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::FEATURED_PROJECTS,
                json!({}),
                vec![CacheTag::collection(ContentKind::Project)],
                TtlTier::Medium,
            ))
            .await
    }

    pub async fn project_by_slug(&self, slug: &str) -> Fetched<Option<ProjectRecord>> {
        self.client
            .fetch(FetchRequest::new(
                queries::PROJECT_BY_SLUG,
                json!({ "slug": slug }),
                vec![
                    CacheTag::collection(ContentKind::Project),
                    CacheTag::entity(ContentKind::Project, slug),
                ],
                TtlTier::Low,
            ))
            .await
    }
}
