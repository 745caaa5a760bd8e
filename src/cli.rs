// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - setup:   save owner/repo/token for later runs
// - log:     page through the commit history with per-commit diff stats
// - contrib: page through the contributor list
//
// Global flags (--verbose, --no-pager, --config, --api-url) can be given
// before or after the subcommand.
// =============================================================================

use crate::github::DEFAULT_API_URL;
use crate::history::DEFAULT_PAGE_SIZE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gitme",
    version,
    about = "Browse a GitHub repository's commit history and contributors",
    long_about = "gitme shows the commit history of a GitHub repository, with per-commit \
                  additions/deletions, and its contributor list, paged through less. \
                  Run `gitme setup` once to save the repository and your access token."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print debug logs to stderr (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print all output at once instead of using a pager, useful for piping to a file
    #[arg(long, global = true)]
    pub no_pager: bool,

    /// Config file location [default: /tmp/gitme-config]
    #[arg(long, global = true, env = "GITME_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// GitHub API base url, change it for GitHub Enterprise
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, value_name = "URL")]
    pub api_url: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save the repository and access token used by the other commands
    ///
    /// Example: gitme setup --owner rust-lang --repo rust --token ghp_xxx
    Setup {
        /// Name of the repo's owner (github.com/<owner>/<repo>)
        #[arg(long)]
        owner: Option<String>,

        /// Name of the repo (github.com/<owner>/<repo>)
        #[arg(long)]
        repo: Option<String>,

        /// Generated GitHub access token
        #[arg(long)]
        token: Option<String>,
    },

    /// Show the repository's commit history
    ///
    /// Example: gitme log --author octocat --since 01-03-2017 --exclude "vendor/ gen/"
    Log(LogArgs),

    /// List the repository's contributors
    ///
    /// Uses the repository saved by `gitme setup` unless --owner and --repo
    /// are both given.
    Contrib {
        /// Name of the repo's owner, overrides the saved one (requires --repo)
        #[arg(long)]
        owner: Option<String>,

        /// Name of the repo, overrides the saved one (requires --owner)
        #[arg(long)]
        repo: Option<String>,

        /// Access token, overrides the saved one
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Only show commits by this GitHub user
    #[arg(long)]
    pub author: Option<String>,

    /// Only show commits after this date (DD-MM-YYYY)
    #[arg(long, value_name = "DD-MM-YYYY")]
    pub since: Option<String>,

    /// Only show commits before this date (DD-MM-YYYY)
    #[arg(long, value_name = "DD-MM-YYYY")]
    pub until: Option<String>,

    /// Only show commits touching this file or directory
    #[arg(long)]
    pub path: Option<String>,

    /// Space separated paths to leave out of the stats, e.g. "vendor/ gen/"
    ///
    /// Matching is by substring, so "gen/" also hides "src/gen/x.go".
    /// Can be repeated.
    #[arg(long, value_delimiter = ' ', value_name = "PATHS")]
    pub exclude: Vec<String>,

    /// Commits per page; this many detail requests run at once
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub page_size: u32,

    /// Show each file's diff under its stats line
    #[arg(long)]
    pub patch: bool,
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why Option<String> for setup's flags instead of required args?
//    - `--token ""` has to be rejected too, which clap would accept as present
//    - Keeping them optional lets commands::setup check both cases in one place
//      and exit with the usage error code
//
// 2. What does value_delimiter = ' ' do?
//    - `--exclude "a b"` becomes two values, "a" and "b"
//    - Vec<String> flags append, so repeating --exclude adds more paths
//
// 3. Why global = true?
//    - The flag is accepted on every subcommand: `gitme log --no-pager` and
//      `gitme --no-pager log` both work
// -----------------------------------------------------------------------------
