use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

use super::{authentication, ShareError};
use crate::crypto::cipher::random_bytes;
use crate::crypto::{
    build_share_info_with_iv, recover_key, CipherMode, KeyMaterial, Secret, ShareSecret,
    SplitStrategy, GCM_NONCE_SIZE,
};
use crate::storage::ContentStore;

pub const SHARE_SCHEMA_VERSION: &str = "1.0";
pub const SHARE_PACKAGE_TYPE: &str = "shared-doc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMeta {
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

/// A portable encrypted snapshot
///
/// Content and title are sealed with AES-256-GCM under one key and the
/// package IV. The key is additively split: `wrapped_partial_key` holds its
/// first 28 bytes sealed under the last 4, and those 4 bytes (hex) are the
/// share secret.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePackage {
    pub schema_version: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde_as(as = "Base64")]
    pub encrypted_content: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub encrypted_title: Vec<u8>,
    pub wrapped_partial_key: String,
    pub iv: String,
    pub meta: ShareMeta,
}

/// Plaintext recovered from a share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedDocument {
    pub content: Vec<u8>,
    pub title: String,
}

impl SharePackage {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ShareError> {
        serde_json::to_vec(self).map_err(|e| ShareError::MalformedPackage(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ShareError> {
        serde_json::from_slice(bytes).map_err(|e| ShareError::MalformedPackage(e.to_string()))
    }

    /// Store the package, returning its content address
    pub async fn store<S>(&self, store: &S) -> Result<String, ShareError>
    where
        S: ContentStore + ?Sized,
    {
        let address = store.put(self.to_bytes()?).await?;
        tracing::debug!("stored share package at {}", address);
        Ok(address)
    }

    pub async fn fetch<S>(store: &S, address: &str) -> Result<Self, ShareError>
    where
        S: ContentStore + ?Sized,
    {
        Self::from_bytes(&store.get(address).await?)
    }
}

/// Build a package for `plaintext`, returning it with its share secret
pub fn build_share_package(
    plaintext: &[u8],
    title: &str,
    file_type: &str,
) -> Result<(SharePackage, ShareSecret), ShareError> {
    if plaintext.is_empty() {
        return Err(ShareError::EmptyContent);
    }
    let key = Secret::generate()?;
    let iv = random_bytes::<GCM_NONCE_SIZE>()?;
    let info = build_share_info_with_iv(&key, SplitStrategy::Additive, iv)?;

    let material = KeyMaterial::new(CipherMode::Gcm, key, iv.to_vec())?;
    let package = SharePackage {
        schema_version: SHARE_SCHEMA_VERSION.to_string(),
        kind: SHARE_PACKAGE_TYPE.to_string(),
        encrypted_content: material.seal(plaintext)?,
        encrypted_title: material.seal(title.as_bytes())?,
        wrapped_partial_key: info.wrapped_partial_key,
        iv: info.iv,
        meta: ShareMeta {
            file_type: file_type.to_string(),
            created_at: Utc::now(),
        },
    };
    Ok((package, info.share_secret))
}

/// Decrypt a package with the secret taken from a share link
pub fn open_share_package(
    package: &SharePackage,
    share_secret: &str,
) -> Result<SharedDocument, ShareError> {
    if package.kind != SHARE_PACKAGE_TYPE {
        return Err(ShareError::MalformedPackage(format!(
            "unexpected package type {:?}",
            package.kind
        )));
    }
    let key = recover_key(
        SplitStrategy::Additive,
        &package.wrapped_partial_key,
        &package.iv,
        share_secret,
    )?;
    let iv = STANDARD
        .decode(&package.iv)
        .map_err(|e| ShareError::KeyReconstructionFailed(format!("iv: {e}")))?;
    let material = KeyMaterial::new(CipherMode::Gcm, key, iv)
        .map_err(|e| ShareError::KeyReconstructionFailed(e.to_string()))?;

    let content = material
        .open(&package.encrypted_content)
        .map_err(authentication)?;
    let title = material
        .open(&package.encrypted_title)
        .map_err(authentication)?;
    let title = String::from_utf8(title)
        .map_err(|_| ShareError::MalformedPackage("title is not utf-8".to_string()))?;

    Ok(SharedDocument { content, title })
}
