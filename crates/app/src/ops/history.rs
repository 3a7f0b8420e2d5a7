use clap::Args;

use common::ledger::{LedgerError, RecordId};

use crate::workspace::{Workspace, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct History {
    /// Record holding the document
    pub record_id: RecordId,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError<sqlx::Error>),
}

#[async_trait::async_trait]
impl crate::op::Op for History {
    type Error = HistoryError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let workspace = Workspace::open(ctx).await?;
        let chain = workspace.load_owned(self.record_id).await?;
        let update_seq = workspace.database().update_seq(self.record_id).await?;

        let mut lines = vec![format!(
            "{} ({} updates)",
            chain.metadata().title,
            update_seq
        )];
        for version in workspace.manager.version_history(&chain) {
            let marker = if version.version_id == chain.current_version() {
                "*"
            } else {
                " "
            };
            lines.push(format!(
                "{} v{}\t{}\t{} bytes\t{:?}\t{}",
                marker,
                version.version_id,
                version.timestamp.to_rfc3339(),
                version.size,
                version.key_format(),
                version.content_address
            ));
        }
        Ok(lines.join("\n"))
    }
}
