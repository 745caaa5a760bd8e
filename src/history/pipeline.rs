// src/history/pipeline.rs
// =============================================================================
// The commit history pipeline behind `gitme log`.
//
// For page = 1, 2, 3, ... until GitHub returns an empty page:
//   1. list one page of commit summaries
//   2. fetch every commit's details concurrently (one future per commit)
//   3. wait for the whole page, then sort back into the order GitHub gave us
//   4. push the rendered blocks into the output sink
//
// Page N+1 is only requested after page N has been handed to the sink, so
// output is strictly page-sequential. Inside a page, fetches finish in any
// order; the index each result carries is what restores the original order.
//
// A failed detail fetch aborts the page and the whole run. There is no retry.
//
// Rust concepts:
// - Generics with a trait bound: stream_history<A: CommitApi> runs against the
//   real GitHubClient or an in-memory fake, with no dynamic dispatch
// - Streams: buffer_unordered keeps every fetch of a page in flight at once
// - TryStreamExt::try_collect: stops at the first Err and drops the rest
// - async move blocks: each future borrows the summary it renders
// =============================================================================

use super::render::{render_commit, render_total};
use crate::error::{GitmeError, Result};
use crate::github::{CommitApi, CommitQuery, CommitSummary, RepositoryRef};
use crate::pager::OutputSink;
use futures::stream::{self, StreamExt, TryStreamExt};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Everything one `gitme log` run needs, built once from the CLI flags.
#[derive(Debug, Clone)]
pub struct LogRequest {
    pub repository: RepositoryRef,
    pub query: CommitQuery,
    /// Commits per page, which is also how many detail fetches run at once.
    pub page_size: u32,
    pub show_patch: bool,
}

/// One rendered commit, tagged with its position in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRenderResult {
    pub original_index: usize,
    pub rendered_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// Every page was rendered and the empty page was reached.
    Complete { commits: usize, pages: u32 },
    /// The reader (pager) went away, so we stopped early.
    ReaderGone { commits: usize },
}

/// Streams the whole commit history for `request` into `sink`.
pub async fn stream_history<A: CommitApi>(
    api: &A,
    request: &LogRequest,
    sink: &OutputSink,
) -> Result<HistoryOutcome> {
    let mut commits = 0;
    let mut page: u32 = 1;  // GitHub pages are 1-based

    loop {
        // Step 1: one page of summaries, in GitHub's order (newest first)
        let summaries = api
            .list_commits_page(&request.repository, &request.query, page, request.page_size)
            .await?;

        // An empty page is the only end-of-history signal
        if summaries.is_empty() {
            log::debug!("Page {page} is empty, end of history");
            break;
        }

        log::debug!("Page {page}: fetching details for {} commit(s)", summaries.len());

        // Steps 2 and 3: fetch and render the whole page, back in page order.
        // The page number goes into the error so the user knows how far we got.
        let rendered = render_page(api, request, &summaries)
            .await
            .map_err(|source| GitmeError::PipelineAborted {
                page,
                source: Box::new(source),
            })?;

        // Step 4: hand the page to the sink. A write only fails once the
        // reader is gone, and then there's no point fetching more.
        for result in rendered {
            if sink.write(result.rendered_text).await.is_err() {
                log::debug!("Output closed after {commits} commit(s), not fetching more pages");
                return Ok(HistoryOutcome::ReaderGone { commits });
            }
            commits += 1;
        }

        page += 1;
    }

    // Footer after the last page
    if sink.write(render_total(commits)).await.is_err() {
        return Ok(HistoryOutcome::ReaderGone { commits });
    }

    Ok(HistoryOutcome::Complete {
        commits,
        pages: page - 1,
    })
}

/// Fetches and renders one page, returning results in the page's order.
///
/// All fetches are in flight at once. The first failure cancels the rest.
pub async fn render_page<A: CommitApi>(
    api: &A,
    request: &LogRequest,
    summaries: &[CommitSummary],
) -> Result<Vec<CommitRenderResult>> {
    // One future per commit, tagged with its index in the page.
    // Nothing runs yet: futures are lazy until the stream polls them.
    let tasks = summaries.iter().enumerate().map(|(index, summary)| async move {
        let detail = api
            .get_commit_detail(&request.repository, &summary.sha)
            .await?;
        log::trace!("Fetched {} ({} file(s))", detail.sha, detail.files.len());

        Ok::<_, GitmeError>(CommitRenderResult {
            original_index: index,
            rendered_text: render_commit(summary, &detail, &request.query, request.show_patch),
        })
    });

    // Concurrency limit = page size, so the whole page is in flight at once.
    // Results arrive in completion order, not page order.
    let mut results: Vec<CommitRenderResult> = stream::iter(tasks)
        .buffer_unordered(summaries.len().max(1))
        .try_collect()
        .await?;

    // Restore the order GitHub gave us
    results.sort_by_key(|result| result.original_index);
    Ok(results)
}
