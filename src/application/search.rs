//! Search aggregation.
//!
//! Fans one user query out across posts and projects, applies independent
//! match and sort rules per collection, and paginates each collection
//! separately. Page 2 of a mixed result therefore re-slices each collection
//! on its own instead of interleaving by relevance; that is the retained
//! policy, not an accident.

use std::sync::Arc;

use tracing::debug;

use crate::content::Fetched;
use crate::domain::entities::{PostRecord, ProjectRecord};

use super::posts::PostService;
use super::projects::ProjectService;

/// Queries shorter than this return empty result sets, not errors.
pub const MIN_QUERY_LEN: usize = 2;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub limit: u32,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, page: u32, limit: u32) -> Self {
        Self {
            query: query.into(),
            page: page.max(1),
            limit: limit.max(1),
        }
    }
}

#[derive(Debug, Default)]
pub struct SearchResults {
    pub posts: Vec<PostRecord>,
    pub projects: Vec<ProjectRecord>,
    /// Sum of the two returned slices' lengths; not the true match count
    /// across the full collections. Kept cheap on purpose.
    pub total: usize,
    /// True when at least one collection degraded to empty because the
    /// store was unreachable.
    pub degraded: bool,
}

pub struct SearchService {
    posts: Arc<PostService>,
    projects: Arc<ProjectService>,
}

impl SearchService {
    pub fn new(posts: Arc<PostService>, projects: Arc<ProjectService>) -> Self {
        Self { posts, projects }
    }

    pub async fn search(&self, request: &SearchRequest) -> SearchResults {
        if request.query.chars().count() < MIN_QUERY_LEN {
            debug!(
                target = "application::search",
                query = %request.query,
                "query below minimum length, short-circuiting"
            );
            return SearchResults::default();
        }

        let needle = request.query.to_lowercase();

        let fetched_posts = self.posts.all_posts().await;
        let fetched_projects = self.projects.all_projects().await;
        let degraded = fetched_posts.is_unavailable() || fetched_projects.is_unavailable();

        let posts = paginate(
            matching_posts(fetched_posts, &needle),
            request.page,
            request.limit,
        );
        let projects = paginate(
            matching_projects(fetched_projects, &needle),
            request.page,
            request.limit,
        );

        let total = posts.len() + projects.len();
        SearchResults {
            posts,
            projects,
            total,
            degraded,
        }
    }
}

fn matching_posts(fetched: Fetched<Vec<PostRecord>>, needle: &str) -> Vec<PostRecord> {
    let mut posts: Vec<PostRecord> = fetched
        .or_default()
        .into_iter()
        .filter(|post| post_matches(post, needle))
        .collect();
    // Publication date descending; undated drafts sink to the end.
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    posts
}

fn matching_projects(fetched: Fetched<Vec<ProjectRecord>>, needle: &str) -> Vec<ProjectRecord> {
    let mut projects: Vec<ProjectRecord> = fetched
        .or_default()
        .into_iter()
        .filter(|project| project_matches(project, needle))
        .collect();
    projects.sort_by_key(|project| project.order);
    projects
}

fn post_matches(post: &PostRecord, needle: &str) -> bool {
    field_matches(&post.title, needle)
        || opt_field_matches(post.excerpt.as_deref(), needle)
        || opt_field_matches(post.body_text.as_deref(), needle)
        || post
            .categories
            .iter()
            .any(|category| field_matches(category, needle))
}

fn project_matches(project: &ProjectRecord, needle: &str) -> bool {
    field_matches(&project.title, needle)
        || opt_field_matches(project.excerpt.as_deref(), needle)
        || opt_field_matches(project.description.as_deref(), needle)
        || opt_field_matches(project.body_text.as_deref(), needle)
        || project
            .technologies
            .iter()
            .any(|tech| field_matches(tech, needle))
        || project
            .categories
            .iter()
            .any(|category| field_matches(category, needle))
}

/// Case-insensitive word-prefix match: `ne` matches "Next.js Guide" via the
/// word "next".
fn field_matches(field: &str, needle: &str) -> bool {
    field
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| !word.is_empty() && word.starts_with(needle))
}

fn opt_field_matches(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|value| field_matches(value, needle))
}

/// `start = (page-1)*limit`, `end = start+limit`, applied to one collection.
fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Vec<T> {
    let start = ((page - 1) as usize).saturating_mul(limit as usize);
    items.into_iter().skip(start).take(limit as usize).collect()
}
