use std::future::IntoFuture;
use std::ops::Deref;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use iroh_blobs::{
    api::{
        blobs::{BlobStatus, Blobs},
        ExportBaoError, RequestError,
    },
    store::{fs::FsStore, mem::MemStore},
    BlobsProtocol, Hash,
};

use super::{ContentStore, StorageError};

/// Client over a local iroh-blob store.
///  Addresses are BLAKE3 hashes rendered as strings, so storing
///  the same encrypted bytes twice yields the same address.
#[derive(Clone, Debug)]
pub struct BlobsStore {
    pub inner: Arc<BlobsProtocol>,
}

impl Deref for BlobsStore {
    type Target = Arc<BlobsProtocol>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlobsStoreError {
    #[error("blobs store error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("blob store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export bao error: {0}")]
    ExportBao(#[from] ExportBaoError),
    #[error("request error: {0}")]
    Request(#[from] RequestError),
}

impl BlobsStore {
    /// Load a blob store from the given path on disk
    pub async fn fs(path: &Path) -> Result<Self, BlobsStoreError> {
        tracing::debug!("BlobsStore::fs called with path: {:?}", path);
        let store = FsStore::load(path).await?;
        let blobs = BlobsProtocol::new(&store, None);
        Ok(Self {
            inner: Arc::new(blobs),
        })
    }

    /// Load a memory blobs store
    pub async fn memory() -> Result<Self, BlobsStoreError> {
        let store = MemStore::new();
        let blobs = BlobsProtocol::new(&store, None);
        Ok(Self {
            inner: Arc::new(blobs),
        })
    }

    /// Get a handle to the underlying blobs client against
    ///  the store
    pub fn blobs(&self) -> &Blobs {
        self.inner.store().blobs()
    }

    /// Get a blob as bytes
    pub async fn get_bytes(&self, hash: &Hash) -> Result<Bytes, BlobsStoreError> {
        let bytes = self.blobs().get_bytes(*hash).await?;
        Ok(bytes)
    }

    /// Store a vec of bytes as a blob
    pub async fn put_bytes(&self, data: Vec<u8>) -> Result<Hash, BlobsStoreError> {
        let hash = self.blobs().add_bytes(data).into_future().await?.hash;
        Ok(hash)
    }

    /// Check whether a blob is fully present locally
    pub async fn stat(&self, hash: &Hash) -> Result<bool, BlobsStoreError> {
        let stat = self
            .blobs()
            .status(*hash)
            .await
            .map_err(|err| BlobsStoreError::Default(anyhow!(err)))?;
        Ok(matches!(stat, BlobStatus::Complete { .. }))
    }
}

#[async_trait]
impl ContentStore for BlobsStore {
    async fn put(&self, data: Vec<u8>) -> Result<String, StorageError> {
        let size = data.len();
        let hash = self.put_bytes(data).await?;
        tracing::debug!(%hash, size, "stored blob");
        Ok(hash.to_string())
    }

    async fn get(&self, address: &str) -> Result<Vec<u8>, StorageError> {
        let hash =
            Hash::from_str(address).map_err(|_| StorageError::InvalidAddress(address.to_string()))?;
        if !self.stat(&hash).await? {
            return Err(StorageError::NotFound(address.to_string()));
        }
        let bytes = self.get_bytes(&hash).await?;
        tracing::debug!(%hash, size = bytes.len(), "fetched blob");
        Ok(bytes.to_vec())
    }
}
