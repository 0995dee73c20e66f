//! Cache tag registry and TTL tiers.
//!
//! The tag naming scheme is the contract between the data access layer
//! (which labels what it fetched) and the revalidation service (which
//! decides what to drop). Both sides go through this module; nothing else
//! in the crate spells out a tag string.

use std::fmt;
use std::time::Duration;

use crate::domain::types::ContentKind;

/// Label attached to cache entries so a whole group can be invalidated
/// without enumerating cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// Collection-level tag (`posts`, `projects`, ...): every query touching
    /// the collection carries it.
    Collection(ContentKind),
    /// Entity-level tag (`post-<slug>`): carried by per-entity fetches so a
    /// single document edit does not flush the whole collection.
    Entity(ContentKind, String),
}

impl CacheTag {
    pub fn collection(kind: ContentKind) -> Self {
        Self::Collection(kind)
    }

    pub fn entity(kind: ContentKind, slug: impl Into<String>) -> Self {
        Self::Entity(kind, slug.into())
    }

    fn collection_name(kind: ContentKind) -> &'static str {
        match kind {
            ContentKind::Post => "posts",
            ContentKind::Project => "projects",
            ContentKind::Page => "pages",
            ContentKind::Settings => "settings",
            ContentKind::Author => "authors",
            ContentKind::Category => "categories",
        }
    }

    fn entity_prefix(kind: ContentKind) -> &'static str {
        match kind {
            ContentKind::Post => "post",
            ContentKind::Project => "project",
            ContentKind::Page => "page",
            ContentKind::Settings => "settings",
            ContentKind::Author => "author",
            ContentKind::Category => "category",
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection(kind) => f.write_str(Self::collection_name(*kind)),
            Self::Entity(kind, slug) => {
                write!(f, "{}-{slug}", Self::entity_prefix(*kind))
            }
        }
    }
}

/// Named revalidation interval applied uniformly by content kind.
///
/// Every data access function pins exactly one tier; there is no per-call
/// override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlTier {
    /// 24 hours, for rarely changing content (single documents).
    Low,
    /// 6 hours, for post and project listings.
    Medium,
    /// 1 hour, for time-sensitive content (site settings).
    High,
    /// 5 minutes, for near-real-time needs.
    VeryHigh,
}

impl TtlTier {
    pub fn duration(&self) -> Duration {
        match self {
            Self::Low => Duration::from_secs(24 * 60 * 60),
            Self::Medium => Duration::from_secs(6 * 60 * 60),
            Self::High => Duration::from_secs(60 * 60),
            Self::VeryHigh => Duration::from_secs(5 * 60),
        }
    }
}
