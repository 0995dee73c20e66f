//! Shared value types.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// URL slug identifying a content record within its collection.
///
/// The store serializes slugs either as a bare string or as the object form
/// `{ "current": "..." }`; both deserialize into `Slug`. Vetrina always
/// serializes the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Slug {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for Slug {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SlugVisitor;

        impl<'de> Visitor<'de> for SlugVisitor {
            type Value = Slug;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a slug string or `{ \"current\": ... }` object")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Slug, E> {
                Ok(Slug::new(value))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Slug, A::Error> {
                let mut current: Option<String> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "current" {
                        current = Some(map.next_value()?);
                    } else {
                        let _ = map.next_value::<serde::de::IgnoredAny>()?;
                    }
                }
                current
                    .map(Slug::new)
                    .ok_or_else(|| de::Error::missing_field("current"))
            }
        }

        deserializer.deserialize_any(SlugVisitor)
    }
}

/// Content document kinds the store publishes change notifications for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Post,
    Project,
    Page,
    Settings,
    Author,
    Category,
}

impl ContentKind {
    /// Parse the `_type` discriminator carried by store documents and
    /// webhook payloads. Unknown types are kept as `None`, not errors; the
    /// revalidation handler falls back to a home-path refresh for them.
    pub fn from_document_type(value: &str) -> Option<Self> {
        match value {
            "post" => Some(Self::Post),
            "project" => Some(Self::Project),
            "page" => Some(Self::Page),
            "siteSettings" => Some(Self::Settings),
            "author" => Some(Self::Author),
            "category" => Some(Self::Category),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Project => "project",
            Self::Page => "page",
            Self::Settings => "siteSettings",
            Self::Author => "author",
            Self::Category => "category",
        }
    }
}
