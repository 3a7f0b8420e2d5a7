use clap::Args;

use common::document::DocumentError;
use common::ledger::RecordId;

use crate::workspace::{Workspace, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct Hide {
    /// Record holding the document
    pub record_id: RecordId,
}

#[derive(Args, Debug, Clone)]
pub struct Unhide {
    /// Record holding the document
    pub record_id: RecordId,
}

#[derive(Debug, thiserror::Error)]
pub enum VisibilityError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

async fn set_visibility(
    ctx: &crate::op::OpContext,
    record_id: RecordId,
    visible: bool,
) -> Result<String, VisibilityError> {
    let workspace = Workspace::open(ctx).await?;
    let chain = workspace.load_owned(record_id).await?;
    let chain = if visible {
        workspace.manager.unhide(&chain)
    } else {
        workspace.manager.hide(&chain)
    };
    workspace.manager.commit(record_id, &chain).await?;
    Ok(super::describe(record_id, &chain))
}

#[async_trait::async_trait]
impl crate::op::Op for Hide {
    type Error = VisibilityError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        set_visibility(ctx, self.record_id, false).await
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Unhide {
    type Error = VisibilityError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        set_visibility(ctx, self.record_id, true).await
    }
}
