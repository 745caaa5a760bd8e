// src/github/mod.rs
// =============================================================================
// This module talks to the GitHub REST API.
//
// Currently implements:
// - Listing one page of commits with author/path/since/until filters
// - Fetching a single commit's per-file additions/deletions
// - Listing every contributor of a repository
//
// Authentication is a personal access token sent as a bearer token.
// =============================================================================

mod client;
mod models;

pub use client::{CommitApi, GitHubClient, DEFAULT_API_URL};
pub use models::{
    CommitDetail, CommitQuery, CommitSummary, Contributor, FileChange, RepositoryRef,
};
