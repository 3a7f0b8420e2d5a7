//! Content-addressed storage for encrypted blobs
//!
//! The core only needs `put(bytes) -> address` and `get(address) -> bytes`.
//! Addresses are opaque strings; identical bytes map to the same address.
//! [`BlobsStore`] is the iroh-blobs backed implementation (in memory or on
//! disk) used by the CLI and the tests.

mod blobs;

use std::fmt::Debug;

use async_trait::async_trait;

pub use blobs::{BlobsStore, BlobsStoreError};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("content not found: {0}")]
    NotFound(String),
    #[error("invalid content address: {0}")]
    InvalidAddress(String),
    #[error("blobs store error: {0}")]
    Blobs(#[from] BlobsStoreError),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ContentStore: Send + Sync + Debug {
    /// Store bytes, returning their content address
    async fn put(&self, data: Vec<u8>) -> Result<String, StorageError>;

    /// Fetch the bytes stored at `address`
    async fn get(&self, address: &str) -> Result<Vec<u8>, StorageError>;
}
