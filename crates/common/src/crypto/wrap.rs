//! Owner key wrapping
//!
//! Wraps symmetric [`KeyMaterial`] for a single document owner so that only the
//! holder of the matching [`OwnerSecretKey`] (reached through an
//! [`OwnerCredentialProvider`]) can recover it.
//!
//! # Envelope
//!
//! 1. **Generate ephemeral keypair**: a throwaway X25519 secret per wrap
//! 2. **ECDH**: ephemeral secret x owner public key
//! 3. **Derive**: BLAKE3 `derive_key` over the shared secret and both public keys
//! 4. **Seal**: XChaCha20-Poly1305 with a random 24-byte nonce
//!
//! On the wire a wrapped string is `0x` followed by the hex encoding of
//! `{"version","nonce","ephemPublicKey","ciphertext"}` JSON.
//!
//! # Combined vs. separate encodings
//!
//! Every unwrap is an interactive prompt for the owner. The combined encoding
//! wraps `{"key","nonce"}` as one string so reading a version costs a single
//! prompt. The older encoding wraps key and nonce as two strings (two prompts);
//! it is still readable.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::cipher::{random_bytes, CipherError, CipherMode, KeyMaterial, Secret, STREAM_NONCE_SIZE};
use super::keys::{OwnerPublicKey, OwnerSecretKey};
use crate::credential::{CredentialError, OwnerCredentialProvider};

/// Envelope scheme identifier
pub const ENVELOPE_VERSION: &str = "x25519-xchacha20poly1305";
/// Value stored in place of a wrapped nonce when the key is wrapped in combined format
pub const COMBINED_FORMAT_SENTINEL: &str = "COMBINED_FORMAT";

const WRAP_CONTEXT: &str = "ledgerdoc 2024-05-01 owner key wrap v1";

#[derive(Debug, thiserror::Error)]
pub enum WrapError {
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("malformed wrapped key: {0}")]
    MalformedEnvelope(String),
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(String),
}

/// An asymmetric envelope around a short UTF-8 payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedEnvelope {
    version: String,
    nonce: String,
    ephem_public_key: String,
    ciphertext: String,
}

impl WrappedEnvelope {
    /// Seal `payload` so only `recipient`'s secret key can open it
    pub fn seal(payload: &str, recipient: &OwnerPublicKey) -> Result<Self, WrapError> {
        let ephemeral = OwnerSecretKey::from(random_bytes::<32>()?);
        let ephemeral_public = ephemeral.public();
        let shared = ephemeral.diffie_hellman(recipient);
        let key = derive_wrap_key(&shared, &ephemeral_public, recipient);

        let nonce = random_bytes::<STREAM_NONCE_SIZE>()?;
        let ciphertext = key.seal(CipherMode::Stream, &nonce, payload.as_bytes())?;

        Ok(Self {
            version: ENVELOPE_VERSION.to_string(),
            nonce: STANDARD.encode(nonce),
            ephem_public_key: ephemeral_public.to_base64(),
            ciphertext: STANDARD.encode(ciphertext),
        })
    }

    /// Open the envelope with the recipient's secret key
    pub fn open(&self, recipient: &OwnerSecretKey) -> Result<String, WrapError> {
        if self.version != ENVELOPE_VERSION {
            return Err(WrapError::UnsupportedVersion(self.version.clone()));
        }
        let ephemeral_public = OwnerPublicKey::from_base64(&self.ephem_public_key)
            .map_err(|e| WrapError::MalformedEnvelope(e.to_string()))?;
        let nonce = STANDARD
            .decode(&self.nonce)
            .map_err(|e| WrapError::MalformedEnvelope(e.to_string()))?;
        let ciphertext = STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| WrapError::MalformedEnvelope(e.to_string()))?;

        let shared = recipient.diffie_hellman(&ephemeral_public);
        let key = derive_wrap_key(&shared, &ephemeral_public, &recipient.public());
        let payload = key.open(CipherMode::Stream, &nonce, &ciphertext)?;

        String::from_utf8(payload).map_err(|e| WrapError::MalformedEnvelope(e.to_string()))
    }

    /// `0x` + hex(JSON)
    pub fn to_wire(&self) -> Result<String, WrapError> {
        let json =
            serde_json::to_vec(self).map_err(|e| WrapError::MalformedEnvelope(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(json)))
    }

    pub fn from_wire(wire: &str) -> Result<Self, WrapError> {
        let hex_part = wire
            .strip_prefix("0x")
            .ok_or_else(|| WrapError::MalformedEnvelope("missing 0x prefix".to_string()))?;
        let json = hex::decode(hex_part).map_err(|e| WrapError::MalformedEnvelope(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| WrapError::MalformedEnvelope(e.to_string()))
    }
}

fn derive_wrap_key(
    shared: &[u8; 32],
    ephemeral: &OwnerPublicKey,
    recipient: &OwnerPublicKey,
) -> Secret {
    let mut ikm = Vec::with_capacity(96);
    ikm.extend_from_slice(shared);
    ikm.extend_from_slice(&ephemeral.to_bytes());
    ikm.extend_from_slice(&recipient.to_bytes());
    Secret::from(blake3::derive_key(WRAP_CONTEXT, &ikm))
}

/// Key and nonce serialized together for the combined encoding
#[derive(Serialize, Deserialize)]
struct CombinedKeyMaterial {
    key: String,
    nonce: String,
}

/// Wrap key and nonce as a single string (combined format)
pub fn wrap_key_material(
    material: &KeyMaterial,
    recipient: &OwnerPublicKey,
) -> Result<String, WrapError> {
    let combined = CombinedKeyMaterial {
        key: material.key_base64(),
        nonce: material.nonce_base64(),
    };
    let payload =
        serde_json::to_string(&combined).map_err(|e| WrapError::MalformedEnvelope(e.to_string()))?;
    WrappedEnvelope::seal(&payload, recipient)?.to_wire()
}

/// Wrap key and nonce as two separate strings (the older two-prompt encoding)
pub fn wrap_key_and_nonce(
    material: &KeyMaterial,
    recipient: &OwnerPublicKey,
) -> Result<(String, String), WrapError> {
    let key = WrappedEnvelope::seal(&material.key_base64(), recipient)?.to_wire()?;
    let nonce = WrappedEnvelope::seal(&material.nonce_base64(), recipient)?.to_wire()?;
    Ok((key, nonce))
}

/// Unwrap a combined-format string through the owner's credential provider.
///
/// Costs exactly one interactive prompt.
pub async fn unwrap_key_material<P>(
    provider: &P,
    wrapped: &str,
    owner: &str,
    mode: CipherMode,
) -> Result<KeyMaterial, WrapError>
where
    P: OwnerCredentialProvider + ?Sized,
{
    let payload = provider.decrypt(wrapped, owner).await?;
    let combined: CombinedKeyMaterial = serde_json::from_str(&payload)
        .map_err(|e| WrapError::MalformedEnvelope(format!("combined payload: {e}")))?;
    Ok(KeyMaterial::from_base64(mode, &combined.key, &combined.nonce)?)
}

/// Unwrap the older separately-wrapped key and nonce (two prompts)
pub async fn unwrap_key_and_nonce<P>(
    provider: &P,
    wrapped_key: &str,
    wrapped_nonce: &str,
    owner: &str,
    mode: CipherMode,
) -> Result<KeyMaterial, WrapError>
where
    P: OwnerCredentialProvider + ?Sized,
{
    let key = provider.decrypt(wrapped_key, owner).await?;
    let nonce = provider.decrypt(wrapped_nonce, owner).await?;
    Ok(KeyMaterial::from_base64(mode, &key, &nonce)?)
}
