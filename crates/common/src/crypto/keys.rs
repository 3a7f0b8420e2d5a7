use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::cipher::random_bytes;

/// Size of an X25519 private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of an X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Number of hash bytes kept when deriving an owner address
const ADDRESS_SIZE: usize = 20;

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Encryption public key of a document owner
///
/// This is what a credential provider hands out so key material can be
/// wrapped for the owner. It travels as standard base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerPublicKey([u8; PUBLIC_KEY_SIZE]);

impl fmt::Debug for OwnerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerPublicKey({})", self.to_base64())
    }
}

impl From<[u8; PUBLIC_KEY_SIZE]> for OwnerPublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        OwnerPublicKey(bytes)
    }
}

impl TryFrom<&[u8]> for OwnerPublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid public key size, expected {}, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut buff = [0; PUBLIC_KEY_SIZE];
        buff.copy_from_slice(bytes);
        Ok(buff.into())
    }
}

impl OwnerPublicKey {
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| anyhow::anyhow!("public key base64 decode error"))?;
        Self::try_from(bytes.as_slice())
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    /// Ledger-facing owner address: `0x` + hex of the first 20 bytes of BLAKE3(key)
    pub fn address(&self) -> String {
        let digest = blake3::hash(&self.0);
        format!("0x{}", hex::encode(&digest.as_bytes()[..ADDRESS_SIZE]))
    }

    pub(crate) fn to_x25519(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0)
    }
}

impl Serialize for OwnerPublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for OwnerPublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        OwnerPublicKey::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Private half of an owner's encryption keypair
///
/// Held only by a credential provider. Never serialized into memos or blobs.
///
/// # Examples
///
/// ```ignore
/// let key = OwnerSecretKey::generate()?;
/// std::fs::write("key.pem", key.to_pem())?;
/// let loaded = OwnerSecretKey::from_pem(&std::fs::read_to_string("key.pem")?)?;
/// assert_eq!(key.public(), loaded.public());
/// ```
#[derive(Clone)]
pub struct OwnerSecretKey(StaticSecret);

impl fmt::Debug for OwnerSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnerSecretKey")
            .field(&self.public().address())
            .finish()
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for OwnerSecretKey {
    fn from(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(StaticSecret::from(bytes))
    }
}

impl OwnerSecretKey {
    pub fn generate() -> Result<Self, KeyError> {
        let bytes = random_bytes::<PRIVATE_KEY_SIZE>().map_err(anyhow::Error::from)?;
        Ok(Self::from(bytes))
    }

    pub fn public(&self) -> OwnerPublicKey {
        OwnerPublicKey(X25519PublicKey::from(&self.0).to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Encode in PEM format with tag "PRIVATE KEY"
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new("PRIVATE KEY", self.to_bytes());
        pem::encode(&pem)
    }

    /// Parse a secret key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "PRIVATE KEY"
    /// - The key size is incorrect
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;

        if pem.tag() != "PRIVATE KEY" {
            return Err(anyhow::anyhow!("invalid PEM tag, expected PRIVATE KEY").into());
        }

        let contents = pem.contents();
        if contents.len() != PRIVATE_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid private key size in PEM, expected {}, got {}",
                PRIVATE_KEY_SIZE,
                contents.len()
            )
            .into());
        }

        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        bytes.copy_from_slice(contents);
        Ok(Self::from(bytes))
    }

    pub(crate) fn diffie_hellman(&self, other: &OwnerPublicKey) -> [u8; 32] {
        self.0.diffie_hellman(&other.to_x25519()).to_bytes()
    }
}
