use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ledgerdoc")]
#[command(about = "Encrypted, versioned markdown documents with link sharing")]
pub struct Args {
    /// Path to the ledgerdoc state directory (defaults to ~/.ledgerdoc)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Approve every credential prompt without asking
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: crate::Command,
}
