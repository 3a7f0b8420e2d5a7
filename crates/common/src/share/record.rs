use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::package::SharedDocument;
use super::{authentication, ShareError};
use crate::crypto::cipher::random_bytes;
use crate::crypto::{
    build_share_info_with_iv, recover_key, CipherMode, KeyMaterial, Secret, ShareSecret,
    SplitStrategy, GCM_NONCE_SIZE,
};
use crate::document::{decode_record, RecordMemo};
use crate::ledger::{LedgerProvider, RecordId};
use crate::storage::ContentStore;

pub const SHARED_ENTRY_TYPE: &str = "shared";

/// Memo of a ledger record holding a shared snapshot
///
/// Everything here is public. The snapshot key is XOR-split: the masked
/// front of its hex encoding is stored, the last 8 hex characters are the
/// share secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub file_type: String,
    pub wrapped_partial_key: String,
    pub iv: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Encrypt a snapshot, store it and record it on the ledger as shared
pub async fn share_to_ledger<S, L>(
    store: &S,
    ledger: &L,
    owner: &str,
    plaintext: &[u8],
    title: &str,
    file_type: &str,
) -> Result<(RecordId, ShareSecret), ShareError>
where
    S: ContentStore + ?Sized,
    L: LedgerProvider + ?Sized,
{
    if plaintext.is_empty() {
        return Err(ShareError::EmptyContent);
    }
    let key = Secret::generate()?;
    let iv = random_bytes::<GCM_NONCE_SIZE>()?;
    let info = build_share_info_with_iv(&key, SplitStrategy::Xor, iv)?;
    let material = KeyMaterial::new(CipherMode::Gcm, key, iv.to_vec())?;

    let address = store.put(material.seal(plaintext)?).await?;
    let entry = SharedEntry {
        kind: SHARED_ENTRY_TYPE.to_string(),
        title: title.to_string(),
        file_type: file_type.to_string(),
        wrapped_partial_key: info.wrapped_partial_key,
        iv: info.iv,
        size: plaintext.len() as u64,
        created_at: Utc::now(),
    };
    let memo = serde_json::to_string(&entry)
        .map_err(|e| ShareError::MalformedPackage(e.to_string()))?;

    let id = ledger.create_record(owner, &address, &memo).await?;
    tracing::info!("shared snapshot as record {}", id);
    Ok((id, info.share_secret))
}

/// Resolve a shared record with the secret from its link. No credential needed.
pub async fn open_shared_record<S, L>(
    store: &S,
    ledger: &L,
    id: RecordId,
    share_secret: &str,
) -> Result<SharedDocument, ShareError>
where
    S: ContentStore + ?Sized,
    L: LedgerProvider + ?Sized,
{
    let record = ledger.get_record(id).await?;
    let entry = match decode_record(&record.memo) {
        Some(RecordMemo::Shared(entry)) => entry,
        _ => return Err(ShareError::NotShared(id)),
    };

    let key = recover_key(
        SplitStrategy::Xor,
        &entry.wrapped_partial_key,
        &entry.iv,
        share_secret,
    )?;
    let iv = STANDARD
        .decode(&entry.iv)
        .map_err(|e| ShareError::KeyReconstructionFailed(format!("iv: {e}")))?;
    let material = KeyMaterial::new(CipherMode::Gcm, key, iv)
        .map_err(|e| ShareError::KeyReconstructionFailed(e.to_string()))?;

    let blob = store.get(&record.content_address).await?;
    let content = material.open(&blob).map_err(authentication)?;
    Ok(SharedDocument {
        content,
        title: entry.title,
    })
}
