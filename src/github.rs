use crate::error::RepoError;
use crate::formatter::FileContent;
use crate::path_tree::PathEntry;
use crate::repo_url::RepoRef;
use futures::{StreamExt, TryStreamExt, stream};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const ACCEPT_OBJECT: &str = "application/vnd.github.object+json";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";

/// Where a file's body can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocator {
    pub url: String,
    pub sha: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
}

/// Map a non-success response to the error taxonomy.
pub fn classify_status(status: u16, rate_limit_remaining: Option<&str>) -> RepoError {
    match status {
        403 if rate_limit_remaining == Some("0") => RepoError::RateLimited,
        429 => RepoError::RateLimited,
        401 | 403 => RepoError::Unauthorized { status },
        404 => RepoError::NotFound,
        _ => RepoError::RequestFailed { status },
    }
}

/// Keep blobs only and turn them into tree entries with a leading `/`.
pub fn listing_entries(items: Vec<TreeItem>) -> Vec<PathEntry<BlobLocator>> {
    items
        .into_iter()
        .filter(|item| item.kind == EntryKind::Blob)
        .filter_map(|item| {
            let url = item.url?;
            let path = if item.path.starts_with('/') {
                item.path
            } else {
                format!("/{}", item.path)
            };
            Some(PathEntry::new(path, BlobLocator {
                url,
                sha: item.sha,
                size: item.size,
            }))
        })
        .collect()
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    concurrency: usize,
}

impl GitHubClient {
    pub fn new(
        api_base: &str,
        token: Option<&str>,
        timeout: Duration,
        concurrency: usize,
    ) -> Result<Self, RepoError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|_| RepoError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(GitHubClient {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            concurrency: concurrency.max(1),
        })
    }

    pub fn contents_url(&self, repo: &RepoRef) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            repo.owner,
            repo.repo,
            repo.path.as_deref().unwrap_or("")
        );
        if let Some(git_ref) = &repo.git_ref {
            url.push_str(&format!("?ref={git_ref}"));
        }
        url
    }

    pub fn tree_url(&self, repo: &RepoRef, sha: &str) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, repo.owner, repo.repo, sha
        )
    }

    async fn get(&self, url: &str, accept: &'static str) -> Result<reqwest::Response, RepoError> {
        tracing::debug!(%url, "GET");
        let response = self.http.get(url).header(ACCEPT, accept).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok());
        let err = classify_status(status.as_u16(), remaining);
        tracing::warn!(%url, status = status.as_u16(), "request failed: {err}");
        Err(err)
    }

    async fn fetch_sha(&self, repo: &RepoRef) -> Result<String, RepoError> {
        let response = self.get(&self.contents_url(repo), ACCEPT_OBJECT).await?;
        let contents: ContentsResponse = response.json().await?;
        Ok(contents.sha)
    }

    /// Flat recursive listing of the requested repository path.
    pub async fn fetch_listing(&self, repo: &RepoRef) -> Result<Vec<TreeItem>, RepoError> {
        let sha = self.fetch_sha(repo).await?;
        let response = self.get(&self.tree_url(repo, &sha), ACCEPT_JSON).await?;
        let tree: TreeResponse = response.json().await?;
        if tree.truncated {
            tracing::warn!(%repo, "GitHub truncated the tree listing; some files are missing");
        }
        tracing::info!(%repo, entries = tree.tree.len(), "fetched repository tree");
        Ok(tree.tree)
    }

    async fn fetch_text(&self, entry: &PathEntry<BlobLocator>) -> Result<FileContent, RepoError> {
        tracing::trace!(path = %entry.path, sha = %entry.meta.sha, "fetching blob");
        let response = self.get(&entry.meta.url, ACCEPT_RAW).await?;
        let text = response.text().await?;
        Ok(FileContent {
            path: entry.path.clone(),
            text,
        })
    }

    /// Fetch every body. Order follows `entries`; the first failure aborts the batch.
    pub async fn fetch_contents(
        &self,
        entries: &[&PathEntry<BlobLocator>],
    ) -> Result<Vec<FileContent>, RepoError> {
        let bytes: u64 = entries.iter().filter_map(|e| e.meta.size).sum();
        tracing::debug!(files = entries.len(), bytes, "fetching file contents");
        let contents: Vec<FileContent> = stream::iter(entries.iter().map(|e| self.fetch_text(e)))
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        tracing::info!(files = contents.len(), "fetched file contents");
        Ok(contents)
    }
}
