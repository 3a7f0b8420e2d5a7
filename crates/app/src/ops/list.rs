use clap::Args;

use common::document::DocumentError;

use crate::workspace::{Workspace, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct List {
    /// Include hidden documents
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[async_trait::async_trait]
impl crate::op::Op for List {
    type Error = ListError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let workspace = Workspace::open(ctx).await?;
        let documents = workspace.manager.list(self.all).await?;

        if documents.is_empty() {
            return Ok("No documents found".to_string());
        }
        Ok(documents
            .iter()
            .map(|(id, chain)| super::describe(*id, chain))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
