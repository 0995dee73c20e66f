//! Access to the external headless content store.

pub mod client;
pub mod queries;

pub use client::{
    ContentClient, ContentStore, FetchRequest, Fetched, HttpContentStore, StoreConnection,
    StoreError,
};
