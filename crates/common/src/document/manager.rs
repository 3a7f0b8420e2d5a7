use std::error::Error;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::chain::{DocumentMetadata, DocumentVersion, KeyFormat, VersionChain, VersionId};
use super::codec::{self, CodecError, RecordMemo};
use super::detect::DocumentTraits;
use crate::credential::{CredentialError, CredentialSession, OwnerCredentialProvider};
use crate::crypto::{
    unwrap_key_and_nonce, unwrap_key_material, wrap_key_material, CipherError, CipherMode,
    KeyMaterial, WrapError, COMBINED_FORMAT_SENTINEL,
};
use crate::ledger::{LedgerError, LedgerProvider, RecordId};
use crate::storage::{ContentStore, StorageError};

/// Cipher used for stored revisions
const DOCUMENT_CIPHER: CipherMode = CipherMode::Stream;

/// How new revisions protect their key material
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyProtection {
    /// Wrap key and nonce for the owner in combined format
    #[default]
    Owner,
    /// Store key and nonce in plain base64
    Plain,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document content is empty")]
    EmptyContent,
    #[error("version {0} not found in chain")]
    VersionNotFound(VersionId),
    #[error("record {0} does not hold a readable document")]
    UnparsableMemo(RecordId),
    #[error("ledger record {0} not found")]
    RecordNotFound(RecordId),
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
    #[error("key wrapping error: {0}")]
    Wrap(WrapError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("ledger error: {0}")]
    Ledger(#[source] Box<dyn Error + Send + Sync>),
}

impl From<WrapError> for DocumentError {
    fn from(e: WrapError) -> Self {
        match e {
            WrapError::Credential(e) => DocumentError::Credential(e),
            WrapError::Cipher(e) => DocumentError::Cipher(e),
            other => DocumentError::Wrap(other),
        }
    }
}

impl<T> From<LedgerError<T>> for DocumentError
where
    T: Error + Send + Sync + 'static,
{
    fn from(e: LedgerError<T>) -> Self {
        match e {
            LedgerError::RecordNotFound(id) => DocumentError::RecordNotFound(id),
            LedgerError::Provider(e) => DocumentError::Ledger(Box::new(e)),
        }
    }
}

/// Publishes, updates and reads one owner's version chains
///
/// Every chain operation takes a chain snapshot and returns a new one. On
/// any error the caller's snapshot is still the latest valid state, so a
/// failed operation can simply be retried with the same input. Blobs
/// written before a later step failed are left orphaned in the store.
///
/// The manager itself does not serialize writers: two actors updating the
/// same record race at the ledger.
#[derive(Debug)]
pub struct DocumentManager<S, L, P> {
    store: S,
    ledger: L,
    credentials: CredentialSession<P>,
    owner: String,
    protection: KeyProtection,
}

impl<S, L, P> DocumentManager<S, L, P>
where
    S: ContentStore,
    L: LedgerProvider,
    P: OwnerCredentialProvider,
{
    pub fn new(store: S, ledger: L, provider: P, owner: impl Into<String>) -> Self {
        Self {
            store,
            ledger,
            credentials: CredentialSession::new(provider),
            owner: owner.into().to_ascii_lowercase(),
            protection: KeyProtection::default(),
        }
    }

    pub fn with_protection(mut self, protection: KeyProtection) -> Self {
        self.protection = protection;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn credentials(&self) -> &CredentialSession<P> {
        &self.credentials
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Encrypt and store a new document as version 1
    pub async fn publish(
        &self,
        plaintext: &[u8],
        file_name: Option<&str>,
    ) -> Result<VersionChain, DocumentError> {
        if plaintext.is_empty() {
            return Err(DocumentError::EmptyContent);
        }
        let traits = DocumentTraits::detect(plaintext, file_name);
        let version = self.seal_version(1, plaintext).await?;

        let metadata = DocumentMetadata {
            file_name: traits.file_name,
            file_type: traits.file_type,
            title: traits.title,
            created_at: version.timestamp,
            updated_at: version.timestamp,
            size: version.size,
            is_visible: true,
        };
        tracing::info!(
            "published {} at {}",
            metadata.file_name,
            version.content_address
        );
        Ok(VersionChain::new(metadata, version))
    }

    /// Append a new revision holding `plaintext` and make it current
    pub async fn update(
        &self,
        chain: &VersionChain,
        plaintext: &[u8],
        file_name: Option<&str>,
    ) -> Result<VersionChain, DocumentError> {
        if plaintext.is_empty() {
            return Err(DocumentError::EmptyContent);
        }
        let version = self.seal_version(chain.next_version_id(), plaintext).await?;

        let mut metadata = chain.metadata().clone();
        let renamed = file_name.map(str::trim).filter(|name| !name.is_empty());
        let traits = DocumentTraits::detect(plaintext, renamed.or(Some(metadata.file_name.as_str())));
        if let Some(name) = renamed {
            metadata.file_name = name.to_string();
            metadata.file_type = traits.file_type;
        }
        metadata.title = traits.title;
        metadata.updated_at = version.timestamp;
        metadata.size = version.size;

        tracing::debug!(
            "appending version {} to {}",
            version.version_id,
            metadata.file_name
        );
        Ok(chain.appended(version, metadata))
    }

    /// Re-publish the plaintext of `target` as a new current revision
    ///
    /// The old ciphertext and key material are never reused.
    pub async fn restore_version(
        &self,
        chain: &VersionChain,
        target: VersionId,
    ) -> Result<VersionChain, DocumentError> {
        let plaintext = self.read_version(chain, target).await?;
        tracing::info!("restoring version {} as {}", target, chain.next_version_id());
        self.update(chain, &plaintext, None).await
    }

    pub fn hide(&self, chain: &VersionChain) -> VersionChain {
        chain.with_visibility(false)
    }

    pub fn unhide(&self, chain: &VersionChain) -> VersionChain {
        chain.with_visibility(true)
    }

    /// Revisions, most recent first
    pub fn version_history<'a>(&self, chain: &'a VersionChain) -> Vec<&'a DocumentVersion> {
        chain.history()
    }

    /// Fetch and decrypt one revision
    pub async fn read_version(
        &self,
        chain: &VersionChain,
        id: VersionId,
    ) -> Result<Vec<u8>, DocumentError> {
        let version = chain.version(id).ok_or(DocumentError::VersionNotFound(id))?;
        let material = self.unwrap_version(version).await?;
        let blob = self.store.get(&version.content_address).await?;
        Ok(material.open(&blob)?)
    }

    pub async fn read_current(&self, chain: &VersionChain) -> Result<Vec<u8>, DocumentError> {
        let current = chain
            .current()
            .ok_or(DocumentError::VersionNotFound(chain.current_version()))?;
        self.read_version(chain, current.version_id).await
    }

    /// Publish a new document and record it on the ledger
    pub async fn create(
        &self,
        plaintext: &[u8],
        file_name: Option<&str>,
    ) -> Result<(RecordId, VersionChain), DocumentError> {
        let chain = self.publish(plaintext, file_name).await?;
        let memo = codec::encode(&chain)?;
        let address = head_address(&chain)?;

        let id = self
            .ledger
            .create_record(&self.owner, address, &memo)
            .await?;
        tracing::info!("created record {} for {}", id, self.owner);
        Ok((id, chain))
    }

    /// Point record `id` at `chain`
    pub async fn commit(&self, id: RecordId, chain: &VersionChain) -> Result<(), DocumentError> {
        let memo = codec::encode(chain)?;
        let address = head_address(chain)?;
        self.ledger.update_record(id, address, &memo).await?;
        tracing::debug!("committed record {} at version {}", id, chain.current_version());
        Ok(())
    }

    /// Read and decode the chain held by record `id`
    pub async fn load(&self, id: RecordId) -> Result<VersionChain, DocumentError> {
        let record = self.ledger.get_record(id).await?;
        let chain = codec::decode(&record.memo).ok_or(DocumentError::UnparsableMemo(id))?;
        Ok(chain.backfilled(&record.content_address, record.created_at))
    }

    /// Documents owned by this manager's owner, hidden ones only on request
    ///
    /// Records that do not decode as documents are skipped.
    pub async fn list(
        &self,
        include_hidden: bool,
    ) -> Result<Vec<(RecordId, VersionChain)>, DocumentError> {
        let ids = self.ledger.list_records_owned_by(&self.owner).await?;
        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self.ledger.get_record(id).await?;
            match codec::decode_record(&record.memo) {
                Some(RecordMemo::Document(chain)) => {
                    if chain.is_visible() || include_hidden {
                        let chain = chain.backfilled(&record.content_address, record.created_at);
                        documents.push((id, chain));
                    }
                }
                Some(RecordMemo::Shared(_)) => {
                    tracing::debug!("skipping shared record {}", id);
                }
                None => {
                    tracing::warn!("skipping record {} with unparsable memo", id);
                }
            }
        }
        Ok(documents)
    }

    async fn seal_version(
        &self,
        version_id: VersionId,
        plaintext: &[u8],
    ) -> Result<DocumentVersion, DocumentError> {
        let material = KeyMaterial::generate(DOCUMENT_CIPHER)?;
        let blob = material.seal(plaintext)?;
        let (wrapped_key, wrapped_nonce_or_sentinel, key_format) = self.protect(&material).await?;
        let content_address = self.store.put(blob).await?;

        Ok(DocumentVersion {
            version_id,
            content_address,
            timestamp: Utc::now(),
            size: plaintext.len() as u64,
            wrapped_key,
            wrapped_nonce_or_sentinel,
            key_format: Some(key_format),
        })
    }

    async fn protect(
        &self,
        material: &KeyMaterial,
    ) -> Result<(String, String, KeyFormat), DocumentError> {
        match self.protection {
            KeyProtection::Owner => {
                let public_key = self.credentials.public_key(&self.owner).await?;
                let wrapped = wrap_key_material(material, &public_key)?;
                Ok((
                    wrapped,
                    COMBINED_FORMAT_SENTINEL.to_string(),
                    KeyFormat::Combined,
                ))
            }
            KeyProtection::Plain => Ok((
                material.key_base64(),
                material.nonce_base64(),
                KeyFormat::Plain,
            )),
        }
    }

    async fn unwrap_version(&self, version: &DocumentVersion) -> Result<KeyMaterial, DocumentError> {
        let format = version.key_format();
        tracing::debug!(
            "unwrapping version {} ({:?})",
            version.version_id,
            format
        );
        let material = match format {
            KeyFormat::Combined => {
                unwrap_key_material(
                    &self.credentials,
                    &version.wrapped_key,
                    &self.owner,
                    DOCUMENT_CIPHER,
                )
                .await?
            }
            KeyFormat::Wallet => {
                unwrap_key_and_nonce(
                    &self.credentials,
                    &version.wrapped_key,
                    &version.wrapped_nonce_or_sentinel,
                    &self.owner,
                    DOCUMENT_CIPHER,
                )
                .await?
            }
            KeyFormat::Plain => KeyMaterial::from_base64(
                DOCUMENT_CIPHER,
                &version.wrapped_key,
                &version.wrapped_nonce_or_sentinel,
            )?,
        };
        Ok(material)
    }
}

fn head_address(chain: &VersionChain) -> Result<&str, DocumentError> {
    chain
        .current()
        .map(|version| version.content_address.as_str())
        .ok_or(DocumentError::VersionNotFound(chain.current_version()))
}
