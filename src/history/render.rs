// src/history/render.rs
// =============================================================================
// Turns commits and contributors into the colored text shown in the pager.
//
// A commit block looks like:
//
//   commit:  4f2a...
//   author:  octocat
//   message: Fix the thing
//   date:    2017-03-01 12:00:00 UTC
//   Additions: 11, Deletions: 3
//   https://github.com/owner/repo/commit/4f2a...
//
//           src/main.rs +10 -2
//           README.md +1 -1
//
// Files matching an exclusion are left out of both the totals and the list.
// =============================================================================

use crate::github::{CommitDetail, CommitQuery, CommitSummary, Contributor, FileChange};
use console::style;
use std::fmt::Write;

/// Totals over the files that survived the exclusion filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStats<'a> {
    pub additions: u64,
    pub deletions: u64,
    pub files: Vec<&'a FileChange>,
}

pub fn aggregate<'a>(detail: &'a CommitDetail, query: &CommitQuery) -> CommitStats<'a> {
    let files: Vec<&FileChange> = detail
        .files
        .iter()
        .filter(|file| !query.is_excluded(&file.filename))
        .collect();

    CommitStats {
        additions: files.iter().map(|f| f.additions).sum(),
        deletions: files.iter().map(|f| f.deletions).sum(),
        files,
    }
}

pub fn render_commit(
    summary: &CommitSummary,
    detail: &CommitDetail,
    query: &CommitQuery,
    show_patch: bool,
) -> String {
    let stats = aggregate(detail, query);
    let date = summary
        .authored_at
        .map(|d| d.format("%Y-%m-%d %H:%M:%S %Z").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    // Writing into a String can't fail
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}",
        style("commit:").yellow().bold(),
        style(&summary.sha).yellow().bold()
    );
    let _ = writeln!(
        out,
        "{}  {}",
        style("author:").white().bold(),
        style(&summary.author_login).white().bold()
    );
    let _ = writeln!(out, "message: {}", summary.message);
    let _ = writeln!(out, "date:    {date}");
    let _ = writeln!(
        out,
        "{}, {}",
        style(format!("Additions: {}", stats.additions)).green(),
        style(format!("Deletions: {}", stats.deletions)).red()
    );
    let _ = writeln!(out, "{}", style(&detail.html_url).blue());
    out.push('\n');

    for file in &stats.files {
        let _ = writeln!(
            out,
            "\t{} {} {}",
            file.filename,
            style(format!("+{}", file.additions)).green(),
            style(format!("-{}", file.deletions)).red()
        );
        if show_patch {
            if let Some(patch) = &file.patch {
                out.push_str(&render_patch(patch));
            }
        }
    }
    out.push_str("\n\n");
    out
}

/// Colors a unified diff: additions green, removals red, the rest plain.
pub fn render_patch(patch: &str) -> String {
    let mut out = String::new();
    for line in patch.lines().filter(|l| !l.is_empty()) {
        let styled = if line.starts_with('+') {
            style(line).green().bold().to_string()
        } else if line.starts_with('-') {
            style(line).red().bold().to_string()
        } else {
            style(line).white().bold().to_string()
        };
        let _ = writeln!(out, "\t\t{styled}");
    }
    out
}

pub fn render_total(commits: usize) -> String {
    format!("{}\n", style(format!("Total commits: {commits}")).yellow().bold())
}

pub fn render_contributor(contributor: &Contributor) -> String {
    format!(
        "{:<4} {:<20} {}\n",
        contributor.contributions,
        contributor.login,
        style(&contributor.profile_url).blue()
    )
}
