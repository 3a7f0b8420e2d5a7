//! Shared test utilities for document integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::credential::LocalCredentialProvider;
use common::crypto::OwnerSecretKey;
use common::document::DocumentManager;
use common::ledger::{
    LedgerError, LedgerProvider, LedgerRecord, MemoryLedger, MemoryLedgerError, RecordId,
};
use common::storage::{BlobsStore, ContentStore, StorageError};
use tempfile::TempDir;

pub type TestManager = DocumentManager<BlobsStore, MemoryLedger, LocalCredentialProvider>;

pub struct TestEnv {
    pub manager: TestManager,
    /// Shares its prompt counter with the provider inside the manager
    pub provider: LocalCredentialProvider,
    pub blobs: BlobsStore,
    pub ledger: MemoryLedger,
    pub key: OwnerSecretKey,
    pub temp_dir: TempDir,
}

/// Set up a manager over a filesystem blob store, an in-memory ledger and a
/// single owner key
pub async fn setup_test_env() -> TestEnv {
    let temp_dir = TempDir::new().unwrap();
    let blobs = BlobsStore::fs(&temp_dir.path().join("blobs")).await.unwrap();
    let ledger = MemoryLedger::new();
    let key = OwnerSecretKey::generate().unwrap();
    let provider = LocalCredentialProvider::new(key.clone());

    let manager = DocumentManager::new(
        blobs.clone(),
        ledger.clone(),
        provider.clone(),
        key.public().address(),
    );

    TestEnv {
        manager,
        provider,
        blobs,
        ledger,
        key,
        temp_dir,
    }
}

/// A store that can be switched into failing every write
#[derive(Debug, Clone)]
pub struct FlakyStore {
    inner: BlobsStore,
    fail_puts: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new(inner: BlobsStore) -> Self {
        Self {
            inner,
            fail_puts: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_puts.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentStore for FlakyStore {
    async fn put(&self, data: Vec<u8>) -> Result<String, StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("store is offline".to_string()));
        }
        self.inner.put(data).await
    }

    async fn get(&self, address: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.get(address).await
    }
}

/// A ledger that can be switched into failing every write
#[derive(Debug, Clone, Default)]
pub struct FlakyLedger {
    inner: MemoryLedger,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyLedger {
    pub fn new(inner: MemoryLedger) -> Self {
        Self {
            inner,
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), LedgerError<MemoryLedgerError>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Provider(MemoryLedgerError::Internal(
                "ledger is offline".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerProvider for FlakyLedger {
    type Error = MemoryLedgerError;

    async fn create_record(
        &self,
        owner: &str,
        content_address: &str,
        memo: &str,
    ) -> Result<RecordId, LedgerError<Self::Error>> {
        self.check()?;
        self.inner.create_record(owner, content_address, memo).await
    }

    async fn update_record(
        &self,
        id: RecordId,
        content_address: &str,
        memo: &str,
    ) -> Result<(), LedgerError<Self::Error>> {
        self.check()?;
        self.inner.update_record(id, content_address, memo).await
    }

    async fn get_record(&self, id: RecordId) -> Result<LedgerRecord, LedgerError<Self::Error>> {
        self.inner.get_record(id).await
    }

    async fn list_records_owned_by(
        &self,
        owner: &str,
    ) -> Result<Vec<RecordId>, LedgerError<Self::Error>> {
        self.inner.list_records_owned_by(owner).await
    }
}
