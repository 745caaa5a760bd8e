// src/error.rs
// =============================================================================
// Typed errors for everything below the CLI layer.
//
// main.rs still works with anyhow::Result (it only needs to print and exit),
// but the config store, the GitHub client and the history pipeline return
// GitmeError so callers can tell "run setup first" apart from "GitHub said
// 404" and pick the right exit code.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitmeError>;

/// Exit code for a command that ran but failed.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for a command invoked with missing/invalid arguments.
pub const EXIT_USAGE: i32 = 2;

#[derive(Error, Debug)]
pub enum GitmeError {
    #[error("couldn't read config file at {path:?}, run `gitme setup` first ({source})")]
    ConfigMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file at {path:?} is not valid: {source}")]
    ConfigInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("couldn't write config file at {path:?}: {source}")]
    ConfigWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}\n\nusage: gitme setup --owner <repo_owner_name> --repo <repo_name> --token <github_token>")]
    MissingField(&'static str),

    #[error("pass date to --{flag} in the correct format DD-MM-YYYY (got {value:?})")]
    InvalidDateFormat { flag: &'static str, value: String },

    #[error("if you want to override the repo info, you must provide both --owner and --repo")]
    InvalidFlagCombination,

    #[error("invalid GitHub API url {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("{}", describe_api_error(.status, .message))]
    Api { status: Option<u16>, message: String },

    #[error("aborted while fetching commit details for page {page}: {source}")]
    PipelineAborted {
        page: u32,
        #[source]
        source: Box<GitmeError>,
    },

    #[error("pager error: {0}")]
    Pager(#[from] std::io::Error),
}

impl GitmeError {
    /// Builds an `Api` error for a transport-level failure (no HTTP status).
    pub fn transport(err: reqwest::Error) -> Self {
        GitmeError::Api {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            GitmeError::MissingField(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

fn describe_api_error(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("GitHub API error (HTTP {code}): {message}"),
        None => format!("GitHub API request failed: {message}"),
    }
}
