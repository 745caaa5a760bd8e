// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and decide where output goes (pager or stdout)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = failure, 2 = usage error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;           // src/cli.rs - command-line parsing
mod commands;      // src/commands.rs - setup/log/contrib handlers
mod config;        // src/config/ - saved owner/repo/token
mod error;         // src/error.rs - typed errors and exit codes
mod github;        // src/github/ - GitHub REST client
mod history;       // src/history/ - concurrent commit fetch + render pipeline
mod logging;       // src/logging.rs - env_logger setup
mod pager;         // src/pager/ - streaming output into less

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::AppContext;
use config::ConfigStore;
use error::{GitmeError, EXIT_FAILURE};
use pager::{OutputMode, PagerCommand};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.downcast_ref::<GitmeError>()
                .map(GitmeError::exit_code)
                .unwrap_or(EXIT_FAILURE)
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let ctx = AppContext {
        store: ConfigStore::locate(cli.config),
        api_url: cli.api_url,
        output: output_mode(cli.no_pager),
    };

    match cli.command {
        Commands::Setup { owner, repo, token } => commands::setup(&ctx, owner, repo, token)?,
        Commands::Log(args) => commands::log(&ctx, args).await?,
        Commands::Contrib { owner, repo, token } => {
            commands::contrib(&ctx, owner, repo, token).await?
        }
    }

    Ok(())
}

// Like git, only page when a human is looking at the terminal
fn output_mode(no_pager: bool) -> OutputMode {
    if no_pager || !console::Term::stdout().is_term() {
        OutputMode::Stdout
    } else {
        OutputMode::Pager(PagerCommand::from_env())
    }
}
