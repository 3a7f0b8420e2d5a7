// CLI modules
mod args;
mod logging;
mod op;
mod ops;
mod prompt;
mod version;

// Local state and persistence
mod database;
mod state;
mod workspace;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Cat, Hide, History, Init, List, Open, Publish, Restore, Share, Unhide, Update, Version};
use state::AppState;

command_enum! {
    (Init, Init),
    (Publish, Publish),
    (Update, Update),
    (Restore, Restore),
    (Hide, Hide),
    (Unhide, Unhide),
    (History, History),
    (Cat, Cat),
    (List, List),
    (Share, Share),
    (Open, Open),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Before `init` there is no config; fall back to the default level
    let log_level = AppState::load(args.config_path.clone())
        .map(|state| state.config.log_level)
        .unwrap_or_else(|_| "info".to_string());
    logging::init_logging(&log_level);

    let ctx = op::OpContext::new(args.config_path, args.yes);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
