//! Vetrina cache system.
//!
//! Keeps statically served content consistent with the external store:
//!
//! - **Query cache**: store query results, labelled with cache tags and a
//!   TTL tier deadline.
//! - **Page cache**: rendered page payloads keyed by request path.
//!
//! The revalidation webhook invalidates by tag and by path; everything else
//! expires by TTL.

mod lock;
mod store;
mod tags;

pub use store::{CacheLimits, CachedPage, PageCache, QueryCache, QueryKey};
pub use tags::{CacheTag, TtlTier};
