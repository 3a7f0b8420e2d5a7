use clap::Args;

use common::document::{DocumentError, VersionId};
use common::ledger::RecordId;
use common::share::{build_share_package, share_to_ledger, ShareError, ShareLink};

use crate::workspace::{Workspace, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct Share {
    /// Record holding the document
    pub record_id: RecordId,

    /// Version to share (defaults to the current one)
    #[arg(long)]
    pub version: Option<VersionId>,

    /// Share as a portable package in the blob store instead of a ledger record
    #[arg(long)]
    pub package: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareOpError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Share(#[from] ShareError),
}

#[async_trait::async_trait]
impl crate::op::Op for Share {
    type Error = ShareOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let workspace = Workspace::open(ctx).await?;
        let base = workspace.share_base()?;
        let chain = workspace.load_owned(self.record_id).await?;
        let plaintext = match self.version {
            Some(version) => workspace.manager.read_version(&chain, version).await?,
            None => workspace.manager.read_current(&chain).await?,
        };
        let metadata = chain.metadata();

        let link = if self.package {
            let (package, secret) =
                build_share_package(&plaintext, &metadata.title, &metadata.file_type)?;
            let address = package.store(workspace.manager.store()).await?;
            ShareLink::Package { address, secret }
        } else {
            let (record_id, secret) = share_to_ledger(
                workspace.manager.store(),
                workspace.database(),
                workspace.manager.owner(),
                &plaintext,
                &metadata.title,
                &metadata.file_type,
            )
            .await?;
            ShareLink::Record { record_id, secret }
        };

        tracing::info!("shared record {} as {}", self.record_id, link);
        Ok(link.to_url(&base)?.to_string())
    }
}
