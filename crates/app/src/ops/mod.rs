pub mod cat;
pub mod hide;
pub mod history;
pub mod init;
pub mod list;
pub mod open;
pub mod publish;
pub mod restore;
pub mod share;
pub mod update;
pub mod version;

pub use cat::Cat;
pub use hide::{Hide, Unhide};
pub use history::History;
pub use init::Init;
pub use list::List;
pub use open::Open;
pub use publish::Publish;
pub use restore::Restore;
pub use share::Share;
pub use update::Update;
pub use version::Version;

use std::path::Path;

use common::document::VersionChain;
use common::ledger::RecordId;

/// One line summary of a document record
pub(crate) fn describe(id: RecordId, chain: &VersionChain) -> String {
    let metadata = chain.metadata();
    let hidden = if chain.is_visible() { "" } else { " [hidden]" };
    format!(
        "{}\t{}\t{} (v{}, {} bytes){}",
        id,
        metadata.file_name,
        metadata.title,
        chain.current_version(),
        metadata.size,
        hidden
    )
}

/// File name to record for content read from `path`
pub(crate) fn file_name_of(path: &Path, explicit: Option<&str>) -> Option<String> {
    explicit.map(str::to_string).or_else(|| {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
    })
}
