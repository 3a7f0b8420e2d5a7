use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{CredentialError, OwnerCredentialProvider};
use crate::crypto::{OwnerPublicKey, OwnerSecretKey, WrapError, WrappedEnvelope};

/// A request the provider must get the owner's consent for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    PublicKey { owner: String },
    Decrypt { owner: String },
}

/// Consent hook, answering `true` approves the prompt
pub type Approval = Arc<dyn Fn(&Prompt) -> bool + Send + Sync>;

/// Credential provider backed by keys held in process
///
/// Every operation goes through the [`Approval`] hook, which defaults to
/// approving everything. The CLI plugs a terminal confirmation in here.
#[derive(Clone)]
pub struct LocalCredentialProvider {
    keys: Arc<HashMap<String, OwnerSecretKey>>,
    approval: Approval,
    prompts: Arc<AtomicUsize>,
}

impl fmt::Debug for LocalCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCredentialProvider")
            .field("owners", &self.keys.keys().collect::<Vec<_>>())
            .field("prompts", &self.prompts())
            .finish()
    }
}

impl LocalCredentialProvider {
    pub fn new(key: OwnerSecretKey) -> Self {
        Self::with_keys([key])
    }

    pub fn with_keys(keys: impl IntoIterator<Item = OwnerSecretKey>) -> Self {
        let keys = keys
            .into_iter()
            .map(|key| (key.public().address(), key))
            .collect();
        Self {
            keys: Arc::new(keys),
            approval: Arc::new(|_| true),
            prompts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_approval<F>(mut self, approval: F) -> Self
    where
        F: Fn(&Prompt) -> bool + Send + Sync + 'static,
    {
        self.approval = Arc::new(approval);
        self
    }

    /// Number of prompts issued so far, approved or not
    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    /// Addresses this provider can act for
    pub fn owners(&self) -> Vec<String> {
        let mut owners: Vec<String> = self.keys.keys().cloned().collect();
        owners.sort();
        owners
    }

    fn key_for(&self, owner: &str) -> Result<&OwnerSecretKey, CredentialError> {
        self.keys
            .get(&owner.to_ascii_lowercase())
            .ok_or_else(|| CredentialError::InvalidParameters(format!("unknown owner {owner}")))
    }

    /// Run the approval hook off the async workers, it may block on a terminal
    async fn ask(&self, prompt: Prompt) -> Result<(), CredentialError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(?prompt, "requesting owner approval");

        let approval = self.approval.clone();
        let asked = prompt.clone();
        let approved = tokio::task::spawn_blocking(move || approval(&asked))
            .await
            .map_err(|e| CredentialError::ProviderInternalError(e.to_string()))?;
        if approved {
            Ok(())
        } else {
            tracing::info!(?prompt, "owner rejected request");
            Err(CredentialError::UserRejected)
        }
    }
}

#[async_trait]
impl OwnerCredentialProvider for LocalCredentialProvider {
    async fn public_key(&self, owner: &str) -> Result<OwnerPublicKey, CredentialError> {
        let key = self.key_for(owner)?;
        self.ask(Prompt::PublicKey {
            owner: owner.to_string(),
        })
        .await?;
        Ok(key.public())
    }

    async fn decrypt(&self, wrapped: &str, owner: &str) -> Result<String, CredentialError> {
        let key = self.key_for(owner)?;
        let envelope = WrappedEnvelope::from_wire(wrapped)
            .map_err(|e| CredentialError::InvalidParameters(e.to_string()))?;
        self.ask(Prompt::Decrypt {
            owner: owner.to_string(),
        })
        .await?;
        envelope.open(key).map_err(|e| match e {
            WrapError::UnsupportedVersion(_) | WrapError::MalformedEnvelope(_) => {
                CredentialError::InvalidParameters(e.to_string())
            }
            other => CredentialError::ProviderInternalError(other.to_string()),
        })
    }
}
