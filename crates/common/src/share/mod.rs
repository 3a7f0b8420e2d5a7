//! Link-based sharing of document snapshots
//!
//! A share exposes exactly one snapshot to anyone holding a short
//! [`ShareSecret`](crate::crypto::ShareSecret). The secret only ever travels
//! in the fragment of a [`ShareLink`], which browsers and HTTP clients never
//! send to a server.
//!
//! Two artifacts exist:
//! - [`SharePackage`]: a self-contained JSON blob (content, title, sealed
//!   partial key) stored at any content address. Additive key split.
//! - [`SharedEntry`]: a ledger record whose memo has `type: "shared"` and
//!   whose content address holds the encrypted snapshot. XOR key split.

mod link;
mod package;
mod record;

use std::error::Error;

use crate::crypto::{CipherError, SplitError};
use crate::ledger::{LedgerError, RecordId};
use crate::storage::StorageError;

pub use link::ShareLink;
pub use package::{
    build_share_package, open_share_package, ShareMeta, SharePackage, SharedDocument,
    SHARE_PACKAGE_TYPE, SHARE_SCHEMA_VERSION,
};
pub use record::{open_shared_record, share_to_ledger, SharedEntry, SHARED_ENTRY_TYPE};

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("shared content is empty")]
    EmptyContent,
    /// The share secret or stored partial key is malformed
    #[error("key reconstruction failed: {0}")]
    KeyReconstructionFailed(String),
    /// The rebuilt key does not authenticate the ciphertext
    #[error("authentication failed: wrong share secret or corrupted data")]
    AuthenticationFailed,
    #[error("record {0} is not a shared document")]
    NotShared(RecordId),
    #[error("malformed share package: {0}")]
    MalformedPackage(String),
    #[error("invalid share link: {0}")]
    InvalidLink(String),
    #[error("ledger record {0} not found")]
    RecordNotFound(RecordId),
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("ledger error: {0}")]
    Ledger(#[source] Box<dyn Error + Send + Sync>),
}

impl From<SplitError> for ShareError {
    fn from(e: SplitError) -> Self {
        match e {
            SplitError::KeyReconstructionFailed(reason) => {
                ShareError::KeyReconstructionFailed(reason)
            }
            SplitError::AuthenticationFailed => ShareError::AuthenticationFailed,
            SplitError::Cipher(e) => ShareError::Cipher(e),
        }
    }
}

impl<T> From<LedgerError<T>> for ShareError
where
    T: Error + Send + Sync + 'static,
{
    fn from(e: LedgerError<T>) -> Self {
        match e {
            LedgerError::RecordNotFound(id) => ShareError::RecordNotFound(id),
            LedgerError::Provider(e) => ShareError::Ledger(Box::new(e)),
        }
    }
}

/// Map a snapshot decryption failure to the share taxonomy
fn authentication(e: CipherError) -> ShareError {
    match e {
        CipherError::DecryptionFailed => ShareError::AuthenticationFailed,
        other => ShareError::Cipher(other),
    }
}
