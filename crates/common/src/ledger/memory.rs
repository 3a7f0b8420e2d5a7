use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::provider::{LedgerError, LedgerProvider, LedgerRecord, RecordId};

/// In-memory ledger using a BTreeMap keyed by record id
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    inner: Arc<RwLock<MemoryLedgerInner>>,
}

#[derive(Debug)]
struct MemoryLedgerInner {
    records: BTreeMap<RecordId, LedgerRecord>,
    /// Next id to hand out; ids start at 1 like token ids
    next_id: RecordId,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryLedgerError {
    #[error("memory ledger error: {0}")]
    Internal(String),
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryLedgerInner {
                records: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(e: impl std::fmt::Display) -> LedgerError<MemoryLedgerError> {
    LedgerError::Provider(MemoryLedgerError::Internal(format!(
        "failed to acquire lock: {}",
        e
    )))
}

#[async_trait]
impl LedgerProvider for MemoryLedger {
    type Error = MemoryLedgerError;

    async fn create_record(
        &self,
        owner: &str,
        content_address: &str,
        memo: &str,
    ) -> Result<RecordId, LedgerError<Self::Error>> {
        let mut inner = self.inner.write().map_err(lock_error)?;

        let id = inner.next_id;
        inner.next_id += 1;
        inner.records.insert(
            id,
            LedgerRecord {
                id,
                owner: owner.to_ascii_lowercase(),
                content_address: content_address.to_string(),
                memo: memo.to_string(),
                created_at: Utc::now(),
            },
        );

        Ok(id)
    }

    async fn update_record(
        &self,
        id: RecordId,
        content_address: &str,
        memo: &str,
    ) -> Result<(), LedgerError<Self::Error>> {
        let mut inner = self.inner.write().map_err(lock_error)?;

        let record = inner
            .records
            .get_mut(&id)
            .ok_or(LedgerError::RecordNotFound(id))?;
        record.content_address = content_address.to_string();
        record.memo = memo.to_string();

        Ok(())
    }

    async fn get_record(&self, id: RecordId) -> Result<LedgerRecord, LedgerError<Self::Error>> {
        let inner = self.inner.read().map_err(lock_error)?;

        inner
            .records
            .get(&id)
            .cloned()
            .ok_or(LedgerError::RecordNotFound(id))
    }

    async fn list_records_owned_by(
        &self,
        owner: &str,
    ) -> Result<Vec<RecordId>, LedgerError<Self::Error>> {
        let inner = self.inner.read().map_err(lock_error)?;
        let owner = owner.to_ascii_lowercase();

        Ok(inner
            .records
            .values()
            .filter(|record| record.owner == owner)
            .map(|record| record.id)
            .collect())
    }
}
