use std::path::PathBuf;

use clap::Args;

use common::document::DocumentError;
use common::ledger::RecordId;

use crate::workspace::{Workspace, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct Update {
    /// Record holding the document
    pub record_id: RecordId,

    /// File with the new content
    pub path: PathBuf,

    /// Rename the document
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("failed to read {0:?}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[async_trait::async_trait]
impl crate::op::Op for Update {
    type Error = UpdateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let plaintext = tokio::fs::read(&self.path)
            .await
            .map_err(|e| UpdateError::Read(self.path.clone(), e))?;

        let workspace = Workspace::open(ctx).await?;
        let chain = workspace.load_owned(self.record_id).await?;
        let chain = workspace
            .manager
            .update(&chain, &plaintext, self.name.as_deref())
            .await?;
        workspace.manager.commit(self.record_id, &chain).await?;

        Ok(super::describe(self.record_id, &chain))
    }
}
