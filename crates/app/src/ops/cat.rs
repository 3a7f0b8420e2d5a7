use clap::Args;

use common::document::{DocumentError, VersionId};
use common::ledger::RecordId;

use crate::workspace::{Workspace, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Record holding the document
    pub record_id: RecordId,

    /// Version to print (defaults to the current one)
    #[arg(long)]
    pub version: Option<VersionId>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[async_trait::async_trait]
impl crate::op::Op for Cat {
    type Error = CatError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let workspace = Workspace::open(ctx).await?;
        let chain = workspace.load_owned(self.record_id).await?;
        let plaintext = match self.version {
            Some(version) => workspace.manager.read_version(&chain, version).await?,
            None => workspace.manager.read_current(&chain).await?,
        };
        Ok(String::from_utf8_lossy(&plaintext).into_owned())
    }
}
