// src/github/client.rs
// =============================================================================
// A small typed client for the three GitHub REST endpoints gitme needs:
//
//   GET /repos/{owner}/{repo}/commits            (one page of summaries)
//   GET /repos/{owner}/{repo}/commits/{sha}      (per-file stats + patch)
//   GET /repos/{owner}/{repo}/contributors       (all pages)
//
// An empty repository has no pages at all: GitHub answers the contributors
// list with 204 No Content and the commits list with 409 "Git Repository is
// empty.". Both come back from get_page as an empty page.
//
// The token goes into a default `Authorization: Bearer` header, so every
// request made through the shared reqwest::Client carries it.
//
// Rust concepts:
// - Traits: CommitApi is the seam the history pipeline depends on, so tests can
//   swap in an in-memory source instead of the network
// - Generics: get_json<T> deserializes into whatever type the caller asks for
// =============================================================================

use super::models::{
    ApiCommitDetail, ApiCommitSummary, ApiContributor, ApiErrorBody, CommitDetail, CommitQuery,
    CommitSummary, Contributor, RepositoryRef,
};
use crate::error::{GitmeError, Result};
use chrono::SecondsFormat;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

// GitHub caps per_page at 100
const CONTRIBUTORS_PER_PAGE: u32 = 100;

/// The two calls the commit history pipeline makes.
pub trait CommitApi {
    /// Returns one page of commits; an empty page means there are no more.
    async fn list_commits_page(
        &self,
        repo: &RepositoryRef,
        query: &CommitQuery,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CommitSummary>>;

    async fn get_commit_detail(&self, repo: &RepositoryRef, sha: &str) -> Result<CommitDetail>;
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: Url,
}

impl GitHubClient {
    /// Builds a client for `api_url`, authenticating with `token` unless it's empty.
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let base_url = parse_base_url(api_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if !token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                GitmeError::Api {
                    status: None,
                    message: "token contains characters that can't be sent in a header".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            log::warn!("No GitHub token configured, requests will be unauthenticated");
        }

        let http = Client::builder()
            .user_agent(concat!("gitme/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(GitmeError::transport)?;

        Ok(Self { http, base_url })
    }

    pub async fn list_contributors(&self, repo: &RepositoryRef) -> Result<Vec<Contributor>> {
        let url = self.endpoint(&["repos", &repo.owner, &repo.name, "contributors"]);
        let mut contributors = Vec::new();

        for page in 1.. {
            let query = [
                ("page", page.to_string()),
                ("per_page", CONTRIBUTORS_PER_PAGE.to_string()),
            ];
            let batch: Vec<ApiContributor> = self.get_page(url.clone(), &query).await?;
            if batch.is_empty() {
                break;
            }
            log::debug!("Fetched {} contributor(s) on page {}", batch.len(), page);
            contributors.extend(batch.into_iter().map(Contributor::from));
        }

        Ok(contributors)
    }

    /// Joins escaped path segments onto the base url.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, url: Url, query: &[(&str, String)]) -> Result<Response> {
        log::debug!("GET {} {:?}", url, query);

        self.http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(GitmeError::transport)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let response = check_status(self.send(url, query).await?).await?;
        response.json::<T>().await.map_err(GitmeError::transport)
    }

    /// Like get_json for list endpoints, but an empty repository is an empty
    /// page instead of an error.
    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self.send(url, query).await?;

        match response.status() {
            // No body at all, nothing to decode
            StatusCode::NO_CONTENT => {
                log::debug!("204 No Content, treating as an empty page");
                Ok(Vec::new())
            }
            StatusCode::CONFLICT => match check_status(response).await {
                Err(GitmeError::Api { message, .. }) if is_empty_repository(&message) => {
                    log::debug!("Repository is empty ({message}), treating as an empty page");
                    Ok(Vec::new())
                }
                Err(e) => Err(e),
                Ok(response) => response.json().await.map_err(GitmeError::transport),
            },
            _ => {
                let response = check_status(response).await?;
                response.json().await.map_err(GitmeError::transport)
            }
        }
    }
}

/// Turns a non-2xx response into GitmeError::Api, keeping GitHub's message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GitmeError::Api {
        status: Some(status.as_u16()),
        message: error_message(&body, status.canonical_reason()),
    })
}

// GitHub's wording for a repository without a single commit
fn is_empty_repository(message: &str) -> bool {
    message.to_ascii_lowercase().contains("repository is empty")
}

impl CommitApi for GitHubClient {
    async fn list_commits_page(
        &self,
        repo: &RepositoryRef,
        query: &CommitQuery,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CommitSummary>> {
        let url = self.endpoint(&["repos", &repo.owner, &repo.name, "commits"]);
        let params = commit_list_params(query, page, per_page);
        let commits: Vec<ApiCommitSummary> = self.get_page(url, &params).await?;
        Ok(commits.into_iter().map(CommitSummary::from).collect())
    }

    async fn get_commit_detail(&self, repo: &RepositoryRef, sha: &str) -> Result<CommitDetail> {
        let url = self.endpoint(&["repos", &repo.owner, &repo.name, "commits", sha]);
        let detail: ApiCommitDetail = self.get_json(url, &[]).await?;
        Ok(detail.into())
    }
}

fn parse_base_url(api_url: &str) -> Result<Url> {
    let invalid = |reason: String| GitmeError::InvalidApiUrl {
        url: api_url.to_string(),
        reason,
    };

    let url = Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url can't be used as a base".to_string()));
    }
    Ok(url)
}

/// Maps the query onto GitHub's list-commits parameters.
fn commit_list_params(query: &CommitQuery, page: u32, per_page: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![("page", page.to_string()), ("per_page", per_page.to_string())];

    if let Some(author) = &query.author {
        params.push(("author", author.clone()));
    }
    if let Some(path) = &query.path {
        params.push(("path", path.clone()));
    }
    if let Some(since) = query.since {
        params.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
    if let Some(until) = query.until {
        params.push(("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }

    params
}

/// Prefers GitHub's JSON `message`, then the raw body, then the status reason.
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    reason.unwrap_or("unknown error").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serves `responses` in order, one connection each, and hands back the
    /// request line of every request it saw.
    async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut request_lines = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();

                // Read until the end of the headers; GETs have no body
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }

                let request = String::from_utf8_lossy(&request).to_string();
                request_lines.push(request.lines().next().unwrap_or_default().to_string());

                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            request_lines
        });

        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = GitHubClient::new(DEFAULT_API_URL, "t").unwrap();
        let repo = RepositoryRef::new("rust-lang", "rust");

        let url = client.endpoint(&["repos", &repo.owner, &repo.name, "commits"]);
        assert_eq!(url.as_str(), "https://api.github.com/repos/rust-lang/rust/commits");

        let url = client.endpoint(&["repos", "we ird", "a/b"]);
        assert_eq!(url.as_str(), "https://api.github.com/repos/we%20ird/a%2Fb");
    }

    #[test]
    fn test_endpoint_keeps_enterprise_prefix() {
        let client = GitHubClient::new("https://ghe.example.com/api/v3/", "").unwrap();
        let url = client.endpoint(&["repos", "o", "r", "contributors"]);
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/o/r/contributors");
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(matches!(
            GitHubClient::new("not a url", "t"),
            Err(GitmeError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            GitHubClient::new("ftp://example.com", "t"),
            Err(GitmeError::InvalidApiUrl { .. })
        ));
    }

    #[test]
    fn test_commit_list_params() {
        let query = CommitQuery {
            author: Some("octocat".to_string()),
            since: Some(Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap()),
            until: None,
            path: Some("src/".to_string()),
            exclude_paths: vec!["gen/".to_string()],
        };

        let params = commit_list_params(&query, 2, 50);
        assert_eq!(
            params,
            vec![
                ("page", "2".to_string()),
                ("per_page", "50".to_string()),
                ("author", "octocat".to_string()),
                ("path", "src/".to_string()),
                ("since", "2017-03-01T00:00:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_message_prefers_github_json() {
        let body = r#"{"message":"Bad credentials","documentation_url":"https://docs.github.com"}"#;
        assert_eq!(error_message(body, Some("Unauthorized")), "Bad credentials");
        assert_eq!(error_message("  oops  ", Some("Bad Gateway")), "oops");
        assert_eq!(error_message("", Some("Bad Gateway")), "Bad Gateway");
        assert_eq!(error_message("", None), "unknown error");
    }

    #[tokio::test]
    async fn test_contributors_of_empty_repository() {
        let (api_url, server) = serve(vec!["HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string()]).await;
        let client = GitHubClient::new(&api_url, "t").unwrap();

        let contributors = client
            .list_contributors(&RepositoryRef::new("o", "empty"))
            .await
            .unwrap();

        assert!(contributors.is_empty());
        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /repos/o/empty/contributors?"));
    }

    #[tokio::test]
    async fn test_contributors_paginate_until_empty_page() {
        let first = r#"[
            {"login":"alice","contributions":42,"html_url":"https://github.com/alice"},
            {"login":"bob","contributions":7,"html_url":"https://github.com/bob"}
        ]"#;
        let (api_url, server) = serve(vec![
            http_response("200 OK", first),
            http_response("200 OK", "[]"),
        ])
        .await;
        let client = GitHubClient::new(&api_url, "t").unwrap();

        let contributors = client
            .list_contributors(&RepositoryRef::new("o", "r"))
            .await
            .unwrap();

        let logins: Vec<_> = contributors.iter().map(|c| c.login.as_str()).collect();
        assert_eq!(logins, vec!["alice", "bob"]);
        assert_eq!(contributors[0].contributions, 42);

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].contains("page=1&per_page=100"), "{}", requests[0]);
        assert!(requests[1].contains("page=2&per_page=100"), "{}", requests[1]);
    }

    #[tokio::test]
    async fn test_commits_of_empty_repository() {
        let body = r#"{"message":"Git Repository is empty.","documentation_url":"https://docs.github.com"}"#;
        let (api_url, server) = serve(vec![http_response("409 Conflict", body)]).await;
        let client = GitHubClient::new(&api_url, "t").unwrap();

        let page = client
            .list_commits_page(&RepositoryRef::new("o", "empty"), &CommitQuery::default(), 1, 50)
            .await
            .unwrap();

        assert!(page.is_empty());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_conflicts_are_still_errors() {
        let body = r#"{"message":"Something else conflicted"}"#;
        let (api_url, _server) = serve(vec![http_response("409 Conflict", body)]).await;
        let client = GitHubClient::new(&api_url, "t").unwrap();

        let result = client
            .list_commits_page(&RepositoryRef::new("o", "r"), &CommitQuery::default(), 1, 50)
            .await;

        assert!(matches!(
            result,
            Err(GitmeError::Api { status: Some(409), ref message }) if message == "Something else conflicted"
        ));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let body = r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#;
        let (api_url, _server) = serve(vec![http_response("404 Not Found", body)]).await;
        let client = GitHubClient::new(&api_url, "t").unwrap();

        let result = client.get_commit_detail(&RepositoryRef::new("o", "r"), "abc123").await;

        assert!(matches!(
            result,
            Err(GitmeError::Api { status: Some(404), ref message }) if message == "Not Found"
        ));
    }
}
