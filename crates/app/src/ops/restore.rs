use clap::Args;

use common::document::{DocumentError, VersionId};
use common::ledger::RecordId;

use crate::workspace::{Workspace, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct Restore {
    /// Record holding the document
    pub record_id: RecordId,

    /// Version whose content becomes the new current version
    pub version: VersionId,
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[async_trait::async_trait]
impl crate::op::Op for Restore {
    type Error = RestoreError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let workspace = Workspace::open(ctx).await?;
        let chain = workspace.load_owned(self.record_id).await?;
        let chain = workspace
            .manager
            .restore_version(&chain, self.version)
            .await?;
        workspace.manager.commit(self.record_id, &chain).await?;

        Ok(format!(
            "restored version {} as version {}",
            self.version,
            chain.current_version()
        ))
    }
}
