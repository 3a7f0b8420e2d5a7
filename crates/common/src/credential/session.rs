use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CredentialError, OwnerCredentialProvider};
use crate::crypto::OwnerPublicKey;

/// A connection-scoped view over a credential provider
///
/// Public keys are cached per owner address for as long as the session
/// lives, so an owner is asked for their encryption key at most once per
/// session. Decrypt requests are always forwarded.
#[derive(Debug)]
pub struct CredentialSession<P> {
    provider: P,
    public_keys: Mutex<HashMap<String, OwnerPublicKey>>,
}

impl<P: OwnerCredentialProvider> CredentialSession<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            public_keys: Mutex::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Drop cached keys, e.g. when the owner disconnects
    pub fn clear(&self) {
        self.public_keys.lock().clear();
    }

    pub fn is_cached(&self, owner: &str) -> bool {
        self.public_keys
            .lock()
            .contains_key(&owner.to_ascii_lowercase())
    }
}

#[async_trait]
impl<P: OwnerCredentialProvider> OwnerCredentialProvider for CredentialSession<P> {
    async fn public_key(&self, owner: &str) -> Result<OwnerPublicKey, CredentialError> {
        let cache_key = owner.to_ascii_lowercase();
        let cached = self.public_keys.lock().get(&cache_key).copied();
        if let Some(key) = cached {
            return Ok(key);
        }

        let key = self.provider.public_key(owner).await?;
        self.public_keys.lock().insert(cache_key, key);
        Ok(key)
    }

    async fn decrypt(&self, wrapped: &str, owner: &str) -> Result<String, CredentialError> {
        self.provider.decrypt(wrapped, owner).await
    }
}
