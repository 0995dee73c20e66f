//! Domain model: content records mirrored from the external store.
//!
//! Vetrina does not own content storage; these types describe the shape of
//! documents the store returns and the identity rules (slug uniqueness) the
//! rest of the system relies on.

pub mod entities;
pub mod types;
