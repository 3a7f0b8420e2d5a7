use clap::Args;

use common::document::KeyProtection;

use crate::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Base url share links are rendered against
    #[arg(long)]
    pub share_base_url: Option<String>,

    /// Store document keys unwrapped instead of wrapping them for the owner
    #[arg(long)]
    pub plain_keys: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid share base url {0:?}: {1}")]
    ShareBaseUrl(String, url::ParseError),
    #[error(transparent)]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::default();
        if let Some(base) = &self.share_base_url {
            url::Url::parse(base).map_err(|e| InitError::ShareBaseUrl(base.clone(), e))?;
            config.share_base_url = base.clone();
        }
        if self.plain_keys {
            config.key_protection = KeyProtection::Plain;
        }

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let owner = state.load_key()?.public().address();
        tracing::info!("initialized {:?}", state.ledgerdoc_dir);

        Ok(format!(
            "Initialized ledgerdoc at {}\nowner: {}",
            state.ledgerdoc_dir.display(),
            owner
        ))
    }
}
