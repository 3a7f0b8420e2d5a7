use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ledger-assigned record (token) identifier
pub type RecordId = u64;

/// A ledger record as returned by `get_record`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: RecordId,
    pub owner: String,
    pub content_address: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError<T> {
    /// Backend failure, passed through untouched
    #[error("unhandled ledger provider error: {0}")]
    Provider(#[from] T),
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),
}

// NOTE: there is no compare-and-swap on update_record. Two writers updating
//  the same record race and the last write wins; a backend that wants to
//  detect this has to track its own update sequence.
#[async_trait]
pub trait LedgerProvider: Send + Sync + Debug {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a record for `owner`
    ///
    /// # Returns
    /// * `Ok(RecordId)` - The identifier assigned by the ledger
    /// * `Err(LedgerError::Provider)` - The backend refused or failed the write
    async fn create_record(
        &self,
        owner: &str,
        content_address: &str,
        memo: &str,
    ) -> Result<RecordId, LedgerError<Self::Error>>;

    /// Point an existing record at a new content address and memo
    ///
    /// Should fail with `Err(LedgerError::RecordNotFound)` for unknown ids.
    async fn update_record(
        &self,
        id: RecordId,
        content_address: &str,
        memo: &str,
    ) -> Result<(), LedgerError<Self::Error>>;

    async fn get_record(&self, id: RecordId) -> Result<LedgerRecord, LedgerError<Self::Error>>;

    /// Ids of every record owned by `owner`, in creation order
    async fn list_records_owned_by(
        &self,
        owner: &str,
    ) -> Result<Vec<RecordId>, LedgerError<Self::Error>>;
}
