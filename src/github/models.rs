// src/github/models.rs
// =============================================================================
// Data types for the GitHub side of gitme.
//
// Two layers live here:
// - Api* structs mirror the JSON GitHub returns (only the fields we read)
// - the plain structs (CommitSummary, CommitDetail, ...) are what the rest of
//   the app works with
//
// GitHub omits or nulls a lot of fields (e.g. `author` is null when the commit
// email isn't linked to an account), so the Api* side is mostly Option<T>.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The repository a command runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Filters for the list-commits call plus the client-side exclusion list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitQuery {
    pub author: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub path: Option<String>,
    pub exclude_paths: Vec<String>,
}

impl CommitQuery {
    /// Sets the exclusion list, dropping empty entries.
    ///
    /// An empty string is a substring of every filename, so keeping one would
    /// silently exclude everything.
    pub fn with_exclusions<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_paths = paths
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        self
    }

    pub fn is_excluded(&self, filename: &str) -> bool {
        self.exclude_paths.iter().any(|p| filename.contains(p.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub sha: String,
    pub author_login: String,
    pub message: String,
    pub authored_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub filename: String,
    pub additions: u64,
    pub deletions: u64,
    pub patch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDetail {
    pub sha: String,
    pub html_url: String,
    pub files: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
    pub profile_url: String,
}

// -----------------------------------------------------------------------------
// Wire types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ApiUser {
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiSignature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCommitBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<ApiSignature>,
}

/// One entry of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiCommitSummary {
    pub sha: String,
    #[serde(default)]
    pub author: Option<ApiUser>,
    pub commit: ApiCommitBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiFile {
    pub filename: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub patch: Option<String>,
}

/// `GET /repos/{owner}/{repo}/commits/{sha}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiCommitDetail {
    pub sha: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub files: Vec<ApiFile>,
}

/// One entry of `GET /repos/{owner}/{repo}/contributors`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiContributor {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub contributions: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Error body GitHub sends with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

impl From<ApiCommitSummary> for CommitSummary {
    fn from(api: ApiCommitSummary) -> Self {
        let signature = api.commit.author;
        let author_login = api
            .author
            .and_then(|user| user.login)
            .or_else(|| signature.as_ref().and_then(|s| s.name.clone()))
            .unwrap_or_default();

        CommitSummary {
            sha: api.sha,
            author_login,
            message: api.commit.message,
            authored_at: signature.and_then(|s| s.date),
        }
    }
}

impl From<ApiCommitDetail> for CommitDetail {
    fn from(api: ApiCommitDetail) -> Self {
        CommitDetail {
            sha: api.sha,
            html_url: api.html_url,
            files: api
                .files
                .into_iter()
                .map(|f| FileChange {
                    filename: f.filename,
                    additions: f.additions,
                    deletions: f.deletions,
                    patch: f.patch,
                })
                .collect(),
        }
    }
}

impl From<ApiContributor> for Contributor {
    fn from(api: ApiContributor) -> Self {
        Contributor {
            login: api.login.unwrap_or_default(),
            contributions: api.contributions,
            profile_url: api.html_url.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_github_json() {
        let json = r#"{
            "sha": "abc123",
            "author": { "login": "octocat", "html_url": "https://github.com/octocat" },
            "commit": {
                "message": "Fix all the things",
                "author": { "name": "The Octocat", "date": "2011-04-14T16:00:49Z" }
            }
        }"#;
        let api: ApiCommitSummary = serde_json::from_str(json).unwrap();
        let summary = CommitSummary::from(api);

        assert_eq!(summary.sha, "abc123");
        assert_eq!(summary.author_login, "octocat");
        assert_eq!(summary.message, "Fix all the things");
        assert_eq!(
            summary.authored_at.unwrap().to_rfc3339(),
            "2011-04-14T16:00:49+00:00"
        );
    }

    #[test]
    fn test_summary_without_linked_account_uses_git_name() {
        let json = r#"{
            "sha": "abc123",
            "author": null,
            "commit": { "message": "m", "author": { "name": "Jane Doe", "date": null } }
        }"#;
        let summary = CommitSummary::from(serde_json::from_str::<ApiCommitSummary>(json).unwrap());
        assert_eq!(summary.author_login, "Jane Doe");
        assert_eq!(summary.authored_at, None);
    }

    #[test]
    fn test_detail_from_github_json() {
        let json = r#"{
            "sha": "abc123",
            "html_url": "https://github.com/o/r/commit/abc123",
            "stats": { "additions": 3, "deletions": 1, "total": 4 },
            "files": [
                { "filename": "src/main.rs", "additions": 3, "deletions": 1, "patch": "@@ -1 +1 @@" },
                { "filename": "logo.png", "additions": 0, "deletions": 0 }
            ]
        }"#;
        let detail = CommitDetail::from(serde_json::from_str::<ApiCommitDetail>(json).unwrap());

        assert_eq!(detail.html_url, "https://github.com/o/r/commit/abc123");
        assert_eq!(detail.files.len(), 2);
        assert_eq!(detail.files[0].additions, 3);
        assert_eq!(detail.files[1].patch, None);
    }

    #[test]
    fn test_exclusions_drop_empty_entries() {
        let query = CommitQuery::default().with_exclusions(vec!["gen/", "", "vendor"]);
        assert_eq!(query.exclude_paths, vec!["gen/".to_string(), "vendor".to_string()]);
        assert!(query.is_excluded("gen/x.pb.go"));
        assert!(query.is_excluded("third_party/vendor/lib.go"));
        assert!(!query.is_excluded("c.go"));
    }
}
