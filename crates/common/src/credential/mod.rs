//! Owner credential providers
//!
//! A provider is the only party holding an owner's private encryption key.
//! Both of its operations may prompt the owner and may be refused; a refusal
//! is reported as [`CredentialError::UserRejected`], never folded into a
//! generic failure, so callers can offer to retry the prompt.

mod local;
mod session;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::crypto::OwnerPublicKey;

pub use local::{Approval, LocalCredentialProvider, Prompt};
pub use session::CredentialSession;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The owner declined the prompt
    #[error("request rejected by the owner")]
    UserRejected,
    /// The request itself was malformed (unknown owner, bad wrapped string)
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    /// No provider is reachable for this owner
    #[error("credential provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("credential provider internal error: {0}")]
    ProviderInternalError(String),
}

/// Interactive access to an owner's encryption keypair
#[async_trait]
pub trait OwnerCredentialProvider: Send + Sync + Debug {
    /// Get the owner's encryption public key. May prompt.
    async fn public_key(&self, owner: &str) -> Result<OwnerPublicKey, CredentialError>;

    /// Decrypt a wrapped string for the owner. Always prompts.
    async fn decrypt(&self, wrapped: &str, owner: &str) -> Result<String, CredentialError>;
}
