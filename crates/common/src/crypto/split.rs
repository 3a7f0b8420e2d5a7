//! Share secret splitting
//!
//! A share link must carry enough to decrypt one snapshot without exposing the
//! full content key anywhere a server could see it. The full key is split in
//! two: a *partial key* that is stored (masked) in public metadata, and a short
//! [`ShareSecret`] that only ever travels in a URL fragment. Both halves are
//! needed to rebuild the key.
//!
//! Two strategies exist and both stay readable:
//!
//! - [`SplitStrategy::Xor`]: hex-encode the key, keep the last 8 hex chars as
//!   the secret, and mask the leading chars by XOR with the secret repeated.
//! - [`SplitStrategy::Additive`]: keep bytes `28..32` as the secret and seal
//!   bytes `0..28` with AES-256-GCM under the secret zero-padded to 32 bytes,
//!   reusing the content IV.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::cipher::{random_bytes, CipherError, CipherMode, Secret, GCM_NONCE_SIZE, SECRET_SIZE};

/// Length of a share secret in hex characters
pub const SHARE_SECRET_LEN: usize = 8;
/// Bytes of the key kept inside the sealed partial key (additive split)
const ADDITIVE_PARTIAL_SIZE: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    /// The secret or stored partial key is malformed
    #[error("key reconstruction failed: {0}")]
    KeyReconstructionFailed(String),
    /// The secret is well formed but does not unlock the partial key
    #[error("authentication failed: share secret does not match")]
    AuthenticationFailed,
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    Xor,
    Additive,
}

/// The short credential carried in a share link fragment
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShareSecret(String);

impl fmt::Debug for ShareSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShareSecret(..)")
    }
}

impl ShareSecret {
    /// Validate and normalize a secret taken from a link fragment
    pub fn parse(raw: &str) -> Result<Self, SplitError> {
        let raw = raw.trim();
        if raw.len() != SHARE_SECRET_LEN {
            return Err(SplitError::KeyReconstructionFailed(format!(
                "share secret must be {} hex characters, got {}",
                SHARE_SECRET_LEN,
                raw.len()
            )));
        }
        if !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SplitError::KeyReconstructionFailed(
                "share secret is not hex".to_string(),
            ));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Public half of a split plus the secret for the recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareInfo {
    /// Masked or sealed partial key, safe to publish
    pub wrapped_partial_key: String,
    /// Base64 AES-GCM IV shared with the content encryption
    pub iv: String,
    pub share_secret: ShareSecret,
}

/// Split `key` with a freshly generated IV
pub fn build_share_info(key: &Secret, strategy: SplitStrategy) -> Result<ShareInfo, SplitError> {
    let iv = random_bytes::<GCM_NONCE_SIZE>()?;
    build_share_info_with_iv(key, strategy, iv)
}

/// Split `key` using the given IV. Deterministic for fixed inputs.
pub fn build_share_info_with_iv(
    key: &Secret,
    strategy: SplitStrategy,
    iv: [u8; GCM_NONCE_SIZE],
) -> Result<ShareInfo, SplitError> {
    let (wrapped_partial_key, share_secret) = match strategy {
        SplitStrategy::Xor => {
            let key_hex = key.to_hex();
            let (front, secret) = key_hex.split_at(key_hex.len() - SHARE_SECRET_LEN);
            (hex::encode(xor_mask(front.as_bytes(), secret.as_bytes())), secret.to_string())
        }
        SplitStrategy::Additive => {
            let (partial, tail) = key.bytes().split_at(ADDITIVE_PARTIAL_SIZE);
            let sealed = pad_secret(tail).seal(CipherMode::Gcm, &iv, partial)?;
            (STANDARD.encode(sealed), hex::encode(tail))
        }
    };

    Ok(ShareInfo {
        wrapped_partial_key,
        iv: STANDARD.encode(iv),
        share_secret: ShareSecret::parse(&share_secret)?,
    })
}

/// Rebuild the full key from the public partial key and the share secret
pub fn recover_key(
    strategy: SplitStrategy,
    wrapped_partial_key: &str,
    iv: &str,
    share_secret: &str,
) -> Result<Secret, SplitError> {
    let secret = ShareSecret::parse(share_secret)?;
    match strategy {
        SplitStrategy::Xor => {
            let masked = hex::decode(wrapped_partial_key).map_err(|e| {
                SplitError::KeyReconstructionFailed(format!("partial key: {e}"))
            })?;
            let front = String::from_utf8(xor_mask(&masked, secret.as_str().as_bytes()))
                .map_err(|_| malformed_front())?;
            if front.len() + SHARE_SECRET_LEN != SECRET_SIZE * 2
                || !front.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(malformed_front());
            }
            Secret::from_hex(&format!("{}{}", front, secret.as_str()))
                .map_err(|e| SplitError::KeyReconstructionFailed(e.to_string()))
        }
        SplitStrategy::Additive => {
            let iv = STANDARD
                .decode(iv)
                .map_err(|e| SplitError::KeyReconstructionFailed(format!("iv: {e}")))?;
            let sealed = STANDARD.decode(wrapped_partial_key).map_err(|e| {
                SplitError::KeyReconstructionFailed(format!("partial key: {e}"))
            })?;
            let tail = hex::decode(secret.as_str())
                .map_err(|e| SplitError::KeyReconstructionFailed(e.to_string()))?;
            let partial = pad_secret(&tail)
                .open(CipherMode::Gcm, &iv, &sealed)
                .map_err(|e| match e {
                    CipherError::DecryptionFailed => SplitError::AuthenticationFailed,
                    other => SplitError::KeyReconstructionFailed(other.to_string()),
                })?;

            let mut full = Vec::with_capacity(SECRET_SIZE);
            full.extend_from_slice(&partial);
            full.extend_from_slice(&tail);
            Secret::from_slice(&full).map_err(|e| SplitError::KeyReconstructionFailed(e.to_string()))
        }
    }
}

fn malformed_front() -> SplitError {
    SplitError::KeyReconstructionFailed("unmasked partial key is not a valid key prefix".into())
}

/// XOR `data` with `mask` repeated to the length of `data`. Self-inverse.
fn xor_mask(data: &[u8], mask: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(mask.iter().cycle())
        .map(|(d, m)| d ^ m)
        .collect()
}

/// Zero-pad the secret tail to a full AES-256 key
fn pad_secret(tail: &[u8]) -> Secret {
    let mut padded = [0u8; SECRET_SIZE];
    padded[..tail.len()].copy_from_slice(tail);
    Secret::from(padded)
}

#[cfg(test)]
mod test {
    use super::*;

    const IV: [u8; GCM_NONCE_SIZE] = [9u8; GCM_NONCE_SIZE];

    #[test]
    fn test_xor_split_roundtrip() {
        let key = Secret::generate().unwrap();
        let info = build_share_info(&key, SplitStrategy::Xor).unwrap();
        assert_eq!(info.share_secret.as_str(), &key.to_hex()[56..]);

        let recovered = recover_key(
            SplitStrategy::Xor,
            &info.wrapped_partial_key,
            &info.iv,
            info.share_secret.as_str(),
        )
        .unwrap();
        assert_eq!(recovered, key);
    }

    #[test]
    fn test_xor_mask_is_self_inverse() {
        let data = b"0123456789abcdef0123456789abcdef0123456789abcdef01234567";
        let mask = b"deadbeef";
        assert_eq!(xor_mask(&xor_mask(data, mask), mask), data.to_vec());
    }

    #[test]
    fn test_additive_split_roundtrip() {
        let key = Secret::generate().unwrap();
        let info = build_share_info(&key, SplitStrategy::Additive).unwrap();
        assert_eq!(info.share_secret.as_str(), hex::encode(&key.bytes()[28..]));

        let recovered = recover_key(
            SplitStrategy::Additive,
            &info.wrapped_partial_key,
            &info.iv,
            info.share_secret.as_str(),
        )
        .unwrap();
        assert_eq!(recovered, key);
    }

    #[test]
    fn test_deterministic_for_fixed_iv() {
        let key = Secret::from([3u8; SECRET_SIZE]);
        for strategy in [SplitStrategy::Xor, SplitStrategy::Additive] {
            let a = build_share_info_with_iv(&key, strategy, IV).unwrap();
            let b = build_share_info_with_iv(&key, strategy, IV).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_partial_key_does_not_contain_secret() {
        let key = Secret::generate().unwrap();
        let info = build_share_info_with_iv(&key, SplitStrategy::Xor, IV).unwrap();
        assert!(!info.wrapped_partial_key.contains(&key.to_hex()[..56]));
    }

    #[test]
    fn test_malformed_secret_is_reconstruction_failure() {
        let key = Secret::generate().unwrap();
        let info = build_share_info(&key, SplitStrategy::Additive).unwrap();
        for bad in ["", "abc", "zzzzzzzz", "0123456789"] {
            let result = recover_key(
                SplitStrategy::Additive,
                &info.wrapped_partial_key,
                &info.iv,
                bad,
            );
            assert!(matches!(result, Err(SplitError::KeyReconstructionFailed(_))));
        }
    }

    #[test]
    fn test_wrong_secret_fails_authentication() {
        let key = Secret::from([5u8; SECRET_SIZE]);
        let info = build_share_info_with_iv(&key, SplitStrategy::Additive, IV).unwrap();
        let result = recover_key(SplitStrategy::Additive, &info.wrapped_partial_key, &info.iv, "00000000");
        assert_eq!(result, Err(SplitError::AuthenticationFailed));
    }

    #[test]
    fn test_secret_is_normalized_to_lowercase() {
        let secret = ShareSecret::parse("DEADBEEF").unwrap();
        assert_eq!(secret.as_str(), "deadbeef");
    }
}
