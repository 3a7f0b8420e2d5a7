/**
 * Credential providers for document owners.
 *  - Interactive public key / decrypt requests
 *  - Session-scoped public key cache
 */
pub mod credential;
/**
 * Cryptographic types and operations.
 *  - Content encryption (stream and GCM)
 *  - Owner key wrapping
 *  - Share secret splitting
 */
pub mod crypto;
/**
 * Versioned encrypted documents: the version
 *  chain, its memo codec and the manager that
 *  publishes, updates and restores revisions.
 */
pub mod document;
/**
 * Ledger (token store) interface and an
 *  in-memory implementation.
 */
pub mod ledger;
/**
 * Link-based sharing of single snapshots,
 *  either as portable packages or as shared
 *  ledger records.
 */
pub mod share;
/**
 * Content-addressed storage layer.
 *  Just a light wrapper around Iroh-Blobs
 */
pub mod storage;

pub mod prelude {
    pub use crate::credential::{
        CredentialError, CredentialSession, LocalCredentialProvider, OwnerCredentialProvider,
    };
    pub use crate::crypto::{CipherMode, OwnerPublicKey, OwnerSecretKey, ShareSecret};
    pub use crate::document::{
        DocumentError, DocumentManager, KeyProtection, VersionChain, VersionId,
    };
    pub use crate::ledger::{LedgerProvider, LedgerRecord, MemoryLedger, RecordId};
    pub use crate::share::{ShareError, ShareLink, SharePackage};
    pub use crate::storage::{BlobsStore, ContentStore, StorageError};
}
