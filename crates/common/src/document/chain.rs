//! # Version chain
//!
//! One [`VersionChain`] is one logical document: its metadata plus every
//! encrypted revision ever published, in append order.
//!
//! ## Invariants
//!
//! - `versions` is append-only. Restoring an old revision appends a new one.
//! - Version ids are unique and assigned as `max(existing) + 1`, so an id is
//!   never reused.
//! - `current_version` should name an entry in `versions`; when it does not,
//!   the last entry is treated as current.
//!
//! Chains are immutable snapshots. Every mutating operation returns a new
//! chain and leaves its input untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::COMBINED_FORMAT_SENTINEL;

/// Schema written by [`super::codec::encode`]
pub const SCHEMA_VERSION: &str = "2.0";

pub type VersionId = u64;

/// How a revision's key material is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    /// Key and nonce wrapped together for the owner; one prompt to read
    Combined,
    /// Key and nonce wrapped separately for the owner; two prompts to read
    Wallet,
    /// Base64 key and nonce stored as-is
    Plain,
}

impl KeyFormat {
    /// Classify untagged key fields by their shape.
    ///
    /// Only used for revisions written before the format was recorded. A
    /// plain base64 key is 44 characters, far below the wallet threshold.
    pub fn classify(wrapped_key: &str, wrapped_nonce_or_sentinel: &str) -> Self {
        if wrapped_nonce_or_sentinel == COMBINED_FORMAT_SENTINEL {
            KeyFormat::Combined
        } else if wrapped_key.starts_with("0x") && wrapped_key.len() > 100 {
            KeyFormat::Wallet
        } else {
            KeyFormat::Plain
        }
    }
}

/// One encrypted revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    pub version_id: VersionId,
    pub content_address: String,
    pub timestamp: DateTime<Utc>,
    pub size: u64,
    pub wrapped_key: String,
    pub wrapped_nonce_or_sentinel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_format: Option<KeyFormat>,
}

impl DocumentVersion {
    /// The recorded key format, or the classified one for legacy revisions
    pub fn key_format(&self) -> KeyFormat {
        self.key_format
            .unwrap_or_else(|| KeyFormat::classify(&self.wrapped_key, &self.wrapped_nonce_or_sentinel))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub file_name: String,
    pub file_type: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub size: u64,
    /// Soft-delete flag; hidden documents keep all their versions
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionChain {
    schema_version: String,
    metadata: DocumentMetadata,
    versions: Vec<DocumentVersion>,
    /// Missing in some writers' memos; 0 resolves to the last version
    #[serde(default)]
    current_version: VersionId,
}

impl VersionChain {
    /// Start a chain from its first revision
    pub(crate) fn new(metadata: DocumentMetadata, first: DocumentVersion) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            metadata,
            current_version: first.version_id,
            versions: vec![first],
        }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// All revisions in append order
    pub fn versions(&self) -> &[DocumentVersion] {
        &self.versions
    }

    /// The id recorded as current, which may be dangling in foreign data
    pub fn current_version(&self) -> VersionId {
        self.current_version
    }

    pub fn is_visible(&self) -> bool {
        self.metadata.is_visible
    }

    /// The current revision, falling back to the last one appended
    pub fn current(&self) -> Option<&DocumentVersion> {
        self.version(self.current_version)
            .or_else(|| self.versions.last())
    }

    pub fn version(&self, id: VersionId) -> Option<&DocumentVersion> {
        self.versions.iter().find(|v| v.version_id == id)
    }

    pub fn next_version_id(&self) -> VersionId {
        self.versions
            .iter()
            .map(|v| v.version_id)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Revisions ordered most recent id first
    pub fn history(&self) -> Vec<&DocumentVersion> {
        let mut history: Vec<&DocumentVersion> = self.versions.iter().collect();
        history.sort_by(|a, b| b.version_id.cmp(&a.version_id));
        history
    }

    /// Copy of this chain with `version` appended and made current
    pub(crate) fn appended(&self, version: DocumentVersion, metadata: DocumentMetadata) -> Self {
        let mut next = self.clone();
        next.metadata = metadata;
        next.current_version = version.version_id;
        next.versions.push(version);
        next
    }

    /// Copy of this chain with the visibility flag set
    pub fn with_visibility(&self, visible: bool) -> Self {
        let mut next = self.clone();
        next.metadata.is_visible = visible;
        next.metadata.updated_at = Utc::now();
        next
    }

    /// Fill in what legacy memos could not record
    ///
    /// Legacy encodings kept the content address outside the memo and had
    /// no timestamps; both come from the ledger record instead.
    pub(crate) fn backfilled(mut self, content_address: &str, created_at: DateTime<Utc>) -> Self {
        let placeholder = placeholder_timestamp();
        for version in self.versions.iter_mut() {
            if version.content_address.is_empty() {
                version.content_address = content_address.to_string();
            }
            if version.timestamp == placeholder {
                version.timestamp = created_at;
            }
        }
        if self.metadata.created_at == placeholder {
            self.metadata.created_at = created_at;
        }
        if self.metadata.updated_at == placeholder {
            self.metadata.updated_at = created_at;
        }
        self
    }
}

/// Timestamp used where a legacy encoding carried none (the Unix epoch)
pub(crate) fn placeholder_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}
