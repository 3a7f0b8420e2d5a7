//! Content encryption for document revisions and share snapshots
//!
//! Two authenticated modes are supported, both keyed with a fresh 256-bit [`Secret`]:
//! - **Stream** (XChaCha20-Poly1305, 24-byte nonce): used for document storage.
//!   The nonce is prepended to the ciphertext so stored blobs are self-describing.
//! - **Gcm** (AES-256-GCM, 12-byte nonce): used on the sharing path. The nonce
//!   travels next to the ciphertext as metadata and is never embedded.
//!
//! Keys and nonces cross API boundaries as standard base64 strings.

use std::fmt;

use aes_gcm::{Aes256Gcm, Nonce as GcmNonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use serde::{Deserialize, Serialize};

/// Size of a content key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the XChaCha20-Poly1305 nonce in bytes
pub const STREAM_NONCE_SIZE: usize = 24;
/// Size of the AES-256-GCM nonce (IV) in bytes
pub const GCM_NONCE_SIZE: usize = 12;

/// Errors that can occur during encryption/decryption
///
/// Input errors (`InvalidKeyFormat`, `InvalidKeySize`, `InvalidNonceSize`) are
/// kept apart from `DecryptionFailed` so callers can tell a malformed key from
/// a tampered or mismatched ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
    #[error("invalid key size, expected {expected}, got {got}")]
    InvalidKeySize { expected: usize, got: usize },
    #[error("invalid nonce size, expected {expected}, got {got}")]
    InvalidNonceSize { expected: usize, got: usize },
    #[error("decryption failed: wrong key, wrong nonce or tampered data")]
    DecryptionFailed,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("random source unavailable: {0}")]
    Random(String),
}

/// Fill a fixed-size buffer from the OS random source
pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N], CipherError> {
    let mut buff = [0u8; N];
    getrandom::getrandom(&mut buff).map_err(|e| CipherError::Random(e.to_string()))?;
    Ok(buff)
}

/// Which AEAD construction a key and nonce belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// XChaCha20-Poly1305, nonce prepended to the stored blob
    Stream,
    /// AES-256-GCM, nonce carried separately
    Gcm,
}

impl CipherMode {
    pub fn nonce_size(&self) -> usize {
        match self {
            CipherMode::Stream => STREAM_NONCE_SIZE,
            CipherMode::Gcm => GCM_NONCE_SIZE,
        }
    }

    /// Encrypt `plaintext` under a freshly generated key and nonce.
    pub fn encrypt(self, plaintext: &[u8]) -> Result<Sealed, CipherError> {
        let material = KeyMaterial::generate(self)?;
        let ciphertext = material.seal(plaintext)?;
        Ok(Sealed {
            ciphertext,
            material,
        })
    }

    /// Decrypt a blob given base64 key and nonce.
    ///
    /// Key and nonce are validated before any decryption is attempted.
    pub fn decrypt(self, blob: &[u8], key: &str, nonce: &str) -> Result<Vec<u8>, CipherError> {
        KeyMaterial::from_base64(self, key, nonce)?.open(blob)
    }
}

/// A 256-bit symmetric key
///
/// Never reused across documents or versions; every encryption call that
/// goes through [`KeyMaterial::generate`] gets its own.
#[derive(PartialEq, Eq, Clone)]
pub struct Secret([u8; SECRET_SIZE]);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using the OS RNG
    pub fn generate() -> Result<Self, CipherError> {
        Ok(Self(random_bytes::<SECRET_SIZE>()?))
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeySize` if the slice is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CipherError> {
        if data.len() != SECRET_SIZE {
            return Err(CipherError::InvalidKeySize {
                expected: SECRET_SIZE,
                got: data.len(),
            });
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CipherError::InvalidKeyFormat(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn from_hex(encoded: &str) -> Result<Self, CipherError> {
        let bytes =
            hex::decode(encoded.trim()).map_err(|e| CipherError::InvalidKeyFormat(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Raw AEAD seal, no nonce framing
    pub(crate) fn seal(
        &self,
        mode: CipherMode,
        nonce: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        check_nonce(mode, nonce)?;
        match mode {
            CipherMode::Stream => XChaCha20Poly1305::new_from_slice(self.bytes())
                .map_err(|_| CipherError::EncryptionFailed)?
                .encrypt(XNonce::from_slice(nonce), data)
                .map_err(|_| CipherError::EncryptionFailed),
            CipherMode::Gcm => Aes256Gcm::new_from_slice(self.bytes())
                .map_err(|_| CipherError::EncryptionFailed)?
                .encrypt(GcmNonce::from_slice(nonce), data)
                .map_err(|_| CipherError::EncryptionFailed),
        }
    }

    /// Raw AEAD open, no nonce framing
    pub(crate) fn open(
        &self,
        mode: CipherMode,
        nonce: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        check_nonce(mode, nonce)?;
        match mode {
            CipherMode::Stream => XChaCha20Poly1305::new_from_slice(self.bytes())
                .map_err(|_| CipherError::DecryptionFailed)?
                .decrypt(XNonce::from_slice(nonce), data)
                .map_err(|_| CipherError::DecryptionFailed),
            CipherMode::Gcm => Aes256Gcm::new_from_slice(self.bytes())
                .map_err(|_| CipherError::DecryptionFailed)?
                .decrypt(GcmNonce::from_slice(nonce), data)
                .map_err(|_| CipherError::DecryptionFailed),
        }
    }
}

fn check_nonce(mode: CipherMode, nonce: &[u8]) -> Result<(), CipherError> {
    if nonce.len() != mode.nonce_size() {
        return Err(CipherError::InvalidNonceSize {
            expected: mode.nonce_size(),
            got: nonce.len(),
        });
    }
    Ok(())
}

/// A key plus the nonce it was (or will be) used with
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    mode: CipherMode,
    secret: Secret,
    nonce: Vec<u8>,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    pub fn generate(mode: CipherMode) -> Result<Self, CipherError> {
        let nonce = match mode {
            CipherMode::Stream => random_bytes::<STREAM_NONCE_SIZE>()?.to_vec(),
            CipherMode::Gcm => random_bytes::<GCM_NONCE_SIZE>()?.to_vec(),
        };
        Ok(Self {
            mode,
            secret: Secret::generate()?,
            nonce,
        })
    }

    pub fn new(mode: CipherMode, secret: Secret, nonce: Vec<u8>) -> Result<Self, CipherError> {
        check_nonce(mode, &nonce)?;
        Ok(Self {
            mode,
            secret,
            nonce,
        })
    }

    /// Parse base64 key and nonce, validating both lengths for `mode`
    pub fn from_base64(mode: CipherMode, key: &str, nonce: &str) -> Result<Self, CipherError> {
        let secret = Secret::from_base64(key)?;
        let nonce = STANDARD
            .decode(nonce.trim())
            .map_err(|e| CipherError::InvalidKeyFormat(format!("nonce: {e}")))?;
        Self::new(mode, secret, nonce)
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn key_base64(&self) -> String {
        self.secret.to_base64()
    }

    pub fn nonce_base64(&self) -> String {
        STANDARD.encode(&self.nonce)
    }

    /// Encrypt into the stored blob layout for this mode.
    ///
    /// Stream: `nonce (24) || ciphertext || tag (16)`. Gcm: `ciphertext || tag (16)`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let ciphertext = self.secret.seal(self.mode, &self.nonce, plaintext)?;
        match self.mode {
            CipherMode::Stream => {
                let mut out = Vec::with_capacity(STREAM_NONCE_SIZE + ciphertext.len());
                out.extend_from_slice(&self.nonce);
                out.extend_from_slice(&ciphertext);
                Ok(out)
            }
            CipherMode::Gcm => Ok(ciphertext),
        }
    }

    /// Decrypt a blob produced by [`KeyMaterial::seal`].
    ///
    /// In stream mode the embedded nonce must match this material's nonce.
    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self.mode {
            CipherMode::Stream => {
                if blob.len() < STREAM_NONCE_SIZE {
                    return Err(CipherError::DecryptionFailed);
                }
                let (embedded, ciphertext) = blob.split_at(STREAM_NONCE_SIZE);
                if embedded != self.nonce.as_slice() {
                    return Err(CipherError::DecryptionFailed);
                }
                self.secret.open(self.mode, &self.nonce, ciphertext)
            }
            CipherMode::Gcm => self.secret.open(self.mode, &self.nonce, blob),
        }
    }
}

/// Output of [`CipherMode::encrypt`]
#[derive(Debug, Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub material: KeyMaterial,
}

impl Sealed {
    /// Base64 key
    pub fn key(&self) -> String {
        self.material.key_base64()
    }

    /// Base64 nonce
    pub fn nonce(&self) -> String {
        self.material.nonce_base64()
    }
}
