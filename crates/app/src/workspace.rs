use common::credential::LocalCredentialProvider;
use common::document::{DocumentError, DocumentManager, VersionChain};
use common::ledger::{LedgerProvider, RecordId};
use common::storage::{BlobsStore, BlobsStoreError};
use url::Url;

use crate::database::{Database, DatabaseSetupError};
use crate::op::OpContext;
use crate::prompt::terminal_approval;
use crate::state::{AppState, StateError};

pub type Manager = DocumentManager<BlobsStore, Database, LocalCredentialProvider>;

/// Everything a command needs, opened from the state directory
#[derive(Debug)]
pub struct Workspace {
    pub state: AppState,
    pub manager: Manager,
}

impl Workspace {
    pub async fn open(ctx: &OpContext) -> Result<Self, WorkspaceError> {
        let state = AppState::load(ctx.config_path.clone())?;
        let key = state.load_key()?;
        let owner = key.public().address();

        let provider =
            LocalCredentialProvider::new(key).with_approval(terminal_approval(ctx.auto_approve));
        let ShareReader { store, database } = ShareReader::from_state(&state).await?;

        tracing::debug!("opened workspace {:?} for {}", state.ledgerdoc_dir, owner);
        let manager = DocumentManager::new(store, database, provider, owner)
            .with_protection(state.config.key_protection);
        Ok(Self { state, manager })
    }

    pub fn database(&self) -> &Database {
        self.manager.ledger()
    }

    pub fn share_base(&self) -> Result<Url, WorkspaceError> {
        self.state
            .config
            .share_base()
            .map_err(|e| WorkspaceError::ShareBaseUrl(self.state.config.share_base_url.clone(), e))
    }

    /// Load a chain that must belong to this workspace's owner
    pub async fn load_owned(&self, id: RecordId) -> Result<VersionChain, WorkspaceError> {
        let record = self
            .database()
            .get_record(id)
            .await
            .map_err(DocumentError::from)?;
        if record.owner != self.manager.owner() {
            return Err(WorkspaceError::NotOwner(id));
        }
        Ok(self.manager.load(id).await?)
    }
}

/// Blob store and ledger without the owner's key, enough to open share links
#[derive(Debug)]
pub struct ShareReader {
    pub store: BlobsStore,
    pub database: Database,
}

impl ShareReader {
    pub async fn open(ctx: &OpContext) -> Result<Self, WorkspaceError> {
        let state = AppState::load(ctx.config_path.clone())?;
        Self::from_state(&state).await
    }

    async fn from_state(state: &AppState) -> Result<Self, WorkspaceError> {
        let store = BlobsStore::fs(&state.blobs_path).await?;
        let database = Database::connect(&state.db_path).await?;
        Ok(Self { store, database })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to open blob store: {0}")]
    Blobs(#[from] BlobsStoreError),
    #[error("failed to open ledger database: {0}")]
    Database(#[from] DatabaseSetupError),
    #[error("invalid share_base_url {0:?}: {1}")]
    ShareBaseUrl(String, url::ParseError),
    #[error("record {0} is not owned by this workspace")]
    NotOwner(RecordId),
    #[error(transparent)]
    Document(#[from] DocumentError),
}
