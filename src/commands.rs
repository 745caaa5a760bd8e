// src/commands.rs
// =============================================================================
// Handlers for the three subcommands.
//
// Every flag check happens before the config file is read or any request is
// sent: a bad date or a lone --owner fails immediately.
//
// Each handler returns crate::error::Result; main.rs turns the error into a
// message and an exit code.
//
// Rust concepts:
// - Option combinators: ok_or and transpose turn optional flags into
//   validated values without nested if/else
// - async move: the producer handed to Pager::present owns the client and
//   the sink, so dropping it closes the pager's input
// =============================================================================

use crate::cli::LogArgs;
use crate::config::{ConfigStore, Settings};
use crate::error::{GitmeError, Result};
use crate::github::{CommitQuery, GitHubClient, RepositoryRef};
use crate::history::{render_contributor, stream_history, HistoryOutcome, LogRequest};
use crate::pager::{self, OutputMode};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

const DATE_FORMAT: &str = "%d-%m-%Y";

/// What every command needs besides its own flags.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub store: ConfigStore,
    pub api_url: String,
    pub output: OutputMode,
}

// -----------------------------------------------------------------------------
// setup
// -----------------------------------------------------------------------------

pub fn setup(
    ctx: &AppContext,
    owner: Option<String>,
    repo: Option<String>,
    token: Option<String>,
) -> Result<()> {
    // Empty strings count as missing, then each missing field is a usage error
    let owner = non_empty(owner).ok_or(GitmeError::MissingField("repo owner name must be provided"))?;
    let repo = non_empty(repo).ok_or(GitmeError::MissingField("repo's name must be provided"))?;
    let token = non_empty(token).ok_or(GitmeError::MissingField(
        "you must provide your generated github access token",
    ))?;

    // Nothing is written unless all three fields passed
    let settings = Settings { owner, repo, token };
    ctx.store.save(&settings)?;

    println!(
        "Saved {}/{} to {}",
        settings.owner,
        settings.repo,
        ctx.store.path().display()
    );
    Ok(())
}

// -----------------------------------------------------------------------------
// log
// -----------------------------------------------------------------------------

pub async fn log(ctx: &AppContext, args: LogArgs) -> Result<()> {
    // Flags first, then the config file, then the network
    let query = build_query(&args)?;
    let settings = ctx.store.load()?;
    let client = GitHubClient::new(&ctx.api_url, &settings.token)?;

    let request = LogRequest {
        repository: RepositoryRef::new(settings.owner, settings.repo),
        query,
        page_size: args.page_size,
        show_patch: args.patch,
    };
    log::debug!("Showing history of {} ({:?})", request.repository, request.query);

    // The producer streams pages into the sink while the pager shows them
    let (sink, pager) = pager::open(&ctx.output);
    pager
        .present(async move {
            match stream_history(&client, &request, &sink).await? {
                HistoryOutcome::Complete { commits, pages } => {
                    log::debug!("Rendered {commits} commit(s) from {pages} page(s)")
                }
                HistoryOutcome::ReaderGone { commits } => {
                    log::debug!("Stopped after {commits} commit(s), pager closed")
                }
            }
            Ok(())
        })
        .await
}

/// Validates the date flags and turns the log flags into a CommitQuery.
pub fn build_query(args: &LogArgs) -> Result<CommitQuery> {
    // Option<&str> -> Option<Result<DateTime>> -> Result<Option<DateTime>>
    let since = args
        .since
        .as_deref()
        .map(|value| parse_date("since", value))
        .transpose()?;
    let until = args
        .until
        .as_deref()
        .map(|value| parse_date("until", value))
        .transpose()?;

    Ok(CommitQuery {
        author: non_empty(args.author.clone()),
        since,
        until,
        path: non_empty(args.path.clone()),
        exclude_paths: Vec::new(),
    }
    .with_exclusions(args.exclude.iter().cloned()))
}

/// Parses DD-MM-YYYY as midnight UTC of that day.
pub fn parse_date(flag: &'static str, value: &str) -> Result<DateTime<Utc>> {
    let invalid = || GitmeError::InvalidDateFormat {
        flag,
        value: value.to_string(),
    };

    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    Ok(Utc.from_utc_datetime(&midnight))
}

// -----------------------------------------------------------------------------
// contrib
// -----------------------------------------------------------------------------

pub async fn contrib(
    ctx: &AppContext,
    owner: Option<String>,
    repo: Option<String>,
    token: Option<String>,
) -> Result<()> {
    // Flag check (and config read, if needed) before any request
    let (repository, token) = resolve_contrib_target(&ctx.store, owner, repo, token)?;
    let client = GitHubClient::new(&ctx.api_url, &token)?;

    // Fetch every page up front; the list is small compared to commit history
    let contributors = client.list_contributors(&repository).await?;
    log::debug!("{} has {} contributor(s)", repository, contributors.len());

    let (sink, pager) = pager::open(&ctx.output);
    pager
        .present(async move {
            for contributor in &contributors {
                // Pager closed, stop writing
                if sink.write(render_contributor(contributor)).await.is_err() {
                    break;
                }
            }
            Ok(())
        })
        .await
}

/// Works out which repository and token `contrib` should use.
///
/// --owner and --repo go together. When both are given along with --token the
/// config file isn't needed at all; otherwise it fills in whatever is missing.
pub fn resolve_contrib_target(
    store: &ConfigStore,
    owner: Option<String>,
    repo: Option<String>,
    token: Option<String>,
) -> Result<(RepositoryRef, String)> {
    // Both or neither
    let override_repo = match (non_empty(owner), non_empty(repo)) {
        (Some(owner), Some(repo)) => Some(RepositoryRef::new(owner, repo)),
        (None, None) => None,
        _ => return Err(GitmeError::InvalidFlagCombination),
    };
    let token = non_empty(token);

    // Everything came from flags, the config file may not even exist
    if let (Some(repository), Some(token)) = (&override_repo, &token) {
        return Ok((repository.clone(), token.clone()));
    }

    let settings = store.load()?;
    let repository =
        override_repo.unwrap_or_else(|| RepositoryRef::new(settings.owner, settings.repo));
    Ok((repository, token.unwrap_or(settings.token)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
