//! Content records fetched from the external store.
//!
//! Field names mirror the store's projection queries (see
//! `content::queries`); serde attributes bridge the store's camelCase wire
//! form to Rust naming.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::types::Slug;

/// Blog post, identified by slug within the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: Slug,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(rename = "bodyText", default)]
    pub body_text: Option<String>,
    #[serde(rename = "publishedAt", default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Portfolio project. `order` is the manual display position used for
/// deterministic listing; `featured` marks homepage picks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: Slug,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "bodyText", default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub links: Vec<ProjectLink>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub order: i64,
}

/// Free-form page (about, imprint, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: Slug,
    #[serde(rename = "bodyText", default)]
    pub body_text: Option<String>,
}

/// Site-wide settings singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettingsRecord {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "socialLinks", default)]
    pub social_links: Vec<SocialLink>,
    #[serde(rename = "analyticsId", default)]
    pub analytics_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    pub label: String,
    pub url: String,
}
