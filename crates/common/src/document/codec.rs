//! Memo encoding for version chains
//!
//! Ledger memos cannot be migrated in place, so every encoding ever written
//! stays readable. Decoding tries a fixed list of decoders in priority order
//! and the first one that produces a chain wins:
//!
//! 1. the current JSON schema (`schemaVersion`, `metadata`, `versions`)
//! 2. the plain-text `Key: <key>, Nonce: <nonce>` memo
//! 3. the legacy JSON memo without `versions`, carrying either
//!    `encryption.{key,nonce}` or top-level `encryptedKey`/`encryptedNonce`
//!
//! Legacy decoders synthesize a single-version chain with an empty content
//! address and placeholder timestamps; the manager backfills those from the
//! ledger record. Encoding only ever emits the current schema.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::chain::{placeholder_timestamp, DocumentMetadata, DocumentVersion, VersionChain};
use crate::share::{SharedEntry, SHARED_ENTRY_TYPE};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("memo does not match any known document encoding")]
    UnparsableMemo,
    #[error("failed to encode version chain: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What a ledger memo turned out to hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordMemo {
    Document(VersionChain),
    Shared(SharedEntry),
}

type Decoder = fn(&str) -> Option<VersionChain>;

const DECODERS: &[(&str, Decoder)] = &[
    ("current", decode_current),
    ("key-nonce", decode_key_nonce),
    ("legacy-json", decode_legacy_json),
];

/// Decode a memo into a chain, or `None` if no known encoding matches
pub fn decode(memo: &str) -> Option<VersionChain> {
    DECODERS.iter().find_map(|(name, decoder)| {
        let chain = decoder(memo)?;
        if *name != "current" {
            tracing::debug!("decoded memo with legacy decoder {}", name);
        }
        Some(chain)
    })
}

/// Like [`decode`], failing with [`CodecError::UnparsableMemo`]
pub fn try_decode(memo: &str) -> Result<VersionChain, CodecError> {
    decode(memo).ok_or(CodecError::UnparsableMemo)
}

/// Serialize to the current schema
pub fn encode(chain: &VersionChain) -> Result<String, CodecError> {
    Ok(serde_json::to_string(chain)?)
}

/// Decode any memo this system writes, shared entries included
pub fn decode_record(memo: &str) -> Option<RecordMemo> {
    if let Ok(entry) = serde_json::from_str::<SharedEntry>(memo) {
        if entry.kind == SHARED_ENTRY_TYPE {
            return Some(RecordMemo::Shared(entry));
        }
    }
    decode(memo).map(RecordMemo::Document)
}

fn decode_current(memo: &str) -> Option<VersionChain> {
    let chain: VersionChain = serde_json::from_str(memo).ok()?;
    if chain.versions().is_empty() {
        return None;
    }
    Some(chain)
}

fn decode_key_nonce(memo: &str) -> Option<VersionChain> {
    let rest = memo.trim().strip_prefix("Key:")?;
    let (key, nonce) = rest.split_once(',')?;
    let nonce = nonce.trim().strip_prefix("Nonce:")?;
    let (key, nonce) = (key.trim(), nonce.trim());
    if key.is_empty() || nonce.is_empty() {
        return None;
    }
    Some(legacy_chain(LegacyMemo::default(), key, nonce))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMemo {
    #[serde(default)]
    encryption: Option<LegacyEncryption>,
    #[serde(default)]
    encrypted_key: Option<String>,
    #[serde(default)]
    encrypted_nonce: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    is_visible: Option<bool>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyEncryption {
    key: String,
    nonce: String,
}

fn decode_legacy_json(memo: &str) -> Option<VersionChain> {
    let value: serde_json::Value = serde_json::from_str(memo).ok()?;
    if !value.is_object() || value.get("versions").is_some() {
        return None;
    }
    let mut legacy: LegacyMemo = serde_json::from_value(value).ok()?;

    let (key, nonce) = match (
        legacy.encryption.take(),
        legacy.encrypted_key.take(),
        legacy.encrypted_nonce.take(),
    ) {
        (Some(encryption), _, _) => (encryption.key, encryption.nonce),
        (None, Some(key), Some(nonce)) => (key, nonce),
        _ => return None,
    };
    Some(legacy_chain(legacy, &key, &nonce))
}

fn legacy_chain(legacy: LegacyMemo, key: &str, nonce: &str) -> VersionChain {
    let timestamp = legacy
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(placeholder_timestamp);
    let size = legacy.size.unwrap_or(0);

    let metadata = DocumentMetadata {
        file_name: legacy.file_name.unwrap_or_else(|| "document.md".to_string()),
        file_type: legacy
            .file_type
            .unwrap_or_else(|| "text/markdown".to_string()),
        title: legacy.title.unwrap_or_else(|| "Untitled".to_string()),
        created_at: timestamp,
        updated_at: timestamp,
        size,
        is_visible: legacy.is_visible.unwrap_or(true),
    };
    let version = DocumentVersion {
        version_id: 1,
        content_address: String::new(),
        timestamp,
        size,
        wrapped_key: key.to_string(),
        wrapped_nonce_or_sentinel: nonce.to_string(),
        key_format: None,
    };
    VersionChain::new(metadata, version)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::chain::KeyFormat;

    #[test]
    fn test_key_nonce_memo() {
        let chain = decode("Key: abc123, Nonce: def456").unwrap();
        assert_eq!(chain.versions().len(), 1);
        assert_eq!(chain.current_version(), 1);
        assert_eq!(chain.versions()[0].wrapped_key, "abc123");
        assert_eq!(chain.versions()[0].wrapped_nonce_or_sentinel, "def456");
        assert_eq!(chain.versions()[0].content_address, "");
        assert_eq!(chain.versions()[0].key_format(), KeyFormat::Plain);
    }

    #[test]
    fn test_legacy_encryption_object() {
        let memo = r#"{"fileName":"old.md","title":"Old","size":12,
            "createdAt":"2023-05-01T10:00:00.000Z","encryption":{"key":"k","nonce":"n"}}"#;
        let chain = decode(memo).unwrap();
        assert_eq!(chain.metadata().file_name, "old.md");
        assert_eq!(chain.metadata().title, "Old");
        assert_eq!(chain.metadata().size, 12);
        assert_eq!(chain.versions()[0].wrapped_key, "k");
        assert_eq!(chain.versions()[0].wrapped_nonce_or_sentinel, "n");
        assert_eq!(
            chain.versions()[0].timestamp,
            parse_timestamp("2023-05-01T10:00:00Z").unwrap()
        );
    }

    #[test]
    fn test_legacy_top_level_fields() {
        let memo = r#"{"encryptedKey":"0xabc","encryptedNonce":"0xdef"}"#;
        let chain = decode(memo).unwrap();
        assert_eq!(chain.versions()[0].wrapped_key, "0xabc");
        assert_eq!(chain.versions()[0].wrapped_nonce_or_sentinel, "0xdef");
        assert_eq!(chain.versions()[0].timestamp, placeholder_timestamp());
    }

    #[test]
    fn test_current_schema_roundtrip() {
        let legacy = decode("Key: abc123, Nonce: def456").unwrap();
        let encoded = encode(&legacy).unwrap();
        assert!(encoded.contains("\"schemaVersion\""));
        assert!(!encoded.contains("Key:"));
        assert_eq!(decode(&encoded).unwrap(), legacy);
    }

    #[test]
    fn test_current_schema_without_current_version() {
        let chain = decode("Key: abc123, Nonce: def456").unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&encode(&chain).unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("currentVersion");
        let memo = value.to_string();
        assert!(!memo.contains("currentVersion"));

        let decoded = decode(&memo).unwrap();
        assert_eq!(decoded.current_version(), 0);
        assert_eq!(decoded.current().unwrap().version_id, 1);
        assert_eq!(decoded.current().unwrap().wrapped_key, "abc123");
    }

    #[test]
    fn test_unparsable() {
        for memo in [
            "",
            "hello",
            "Key: , Nonce: x",
            "{}",
            r#"{"encryptedKey":"only-key"}"#,
            r#"{"schemaVersion":"2.0","versions":[]}"#,
            "[1,2,3]",
        ] {
            assert!(decode(memo).is_none(), "{memo:?} should not decode");
        }
        assert!(matches!(try_decode("nope"), Err(CodecError::UnparsableMemo)));
    }

    #[test]
    fn test_versions_array_blocks_legacy_fallback() {
        let memo = r#"{"versions":"garbage","encryptedKey":"k","encryptedNonce":"n"}"#;
        assert!(decode(memo).is_none());
    }

    #[test]
    fn test_decode_record_document() {
        let memo = encode(&decode("Key: a, Nonce: b").unwrap()).unwrap();
        assert!(matches!(decode_record(&memo), Some(RecordMemo::Document(_))));
        assert!(decode_record("garbage").is_none());
    }
}
