use std::path::PathBuf;

use clap::Args;

use common::share::{open_share_package, open_shared_record, ShareError, ShareLink, SharePackage};

use crate::workspace::{ShareReader, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct Open {
    /// Share link including its #key= fragment
    pub link: String,

    /// Write the content to a file instead of printing it
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error("failed to write {0:?}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Open {
    type Error = OpenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let link = ShareLink::parse(&self.link)?;
        let reader = ShareReader::open(ctx).await?;
        let store = &reader.store;

        let document = match &link {
            ShareLink::Record { record_id, secret } => {
                open_shared_record(store, &reader.database, *record_id, secret.as_str())
                    .await?
            }
            ShareLink::Package { address, secret } => {
                let package = SharePackage::fetch(store, address).await?;
                open_share_package(&package, secret.as_str())?
            }
        };
        tracing::debug!("opened {}", link);

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &document.content)
                    .await
                    .map_err(|e| OpenError::Write(path.clone(), e))?;
                Ok(format!("{} -> {}", document.title, path.display()))
            }
            None => {
                tracing::info!("{}", document.title);
                Ok(String::from_utf8_lossy(&document.content).into_owned())
            }
        }
    }
}
