//! Remote document-store access.
//!
//! The catalogue lives in a hosted collection with one document per
//! category plus a reserved manifest document. Everything here is a thin
//! client: consistency is whatever the hosted store provides, we only do
//! per-document reads and wholesale writes.

mod client;
mod memory;

pub use client::{set_silent, RemoteStore};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by document-store calls.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("Store unreachable: {0}")]
    Network(String),

    /// The store answered with a non-success status.
    #[error("Store returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body was not the JSON we expected.
    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

/// Seam over the hosted document store. The production implementation is
/// [`RemoteStore`]; tests and the fixtures-backed dev mode use
/// [`MemoryStore`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every document in a collection as `(id, body)` pairs.
    async fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;

    /// Fetch one document, `Ok(None)` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Replace one document wholesale.
    async fn put_document(&self, collection: &str, id: &str, body: &Value)
        -> Result<(), StoreError>;
}
