use std::path::PathBuf;

use clap::Args;

use common::document::DocumentError;

use crate::workspace::{Workspace, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct Publish {
    /// File to publish
    pub path: PathBuf,

    /// File name to record (defaults to the file's own name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to read {0:?}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[async_trait::async_trait]
impl crate::op::Op for Publish {
    type Error = PublishError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let plaintext = tokio::fs::read(&self.path)
            .await
            .map_err(|e| PublishError::Read(self.path.clone(), e))?;
        let file_name = super::file_name_of(&self.path, self.name.as_deref());

        let workspace = Workspace::open(ctx).await?;
        let (id, chain) = workspace
            .manager
            .create(&plaintext, file_name.as_deref())
            .await?;

        Ok(super::describe(id, &chain))
    }
}
