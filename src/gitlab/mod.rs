mod helpers;
pub mod ids;
pub mod types;

pub use helpers::{
    apply_line_range, clamp_per_page, decode_content, filter_tree_entries, parse_line_range,
    parse_project, validate_path, validate_ref,
};
use helpers::encode_segment;

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{Config, Token};
use crate::users::UserDirectory;
use types::*;

/// A query string as an ordered list of `key=value` pairs.
pub type QueryParams = [(&'static str, String)];

const TREE_PAGE_SIZE: usize = 100;
/// Upper bound on tree pages fetched for one listing (10k entries).
const MAX_TREE_PAGES: u32 = 100;

/// Errors returned by GitLab API operations.
#[derive(Debug, thiserror::Error)]
pub enum GitLabError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitLab rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("GitLab API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("GitLab API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(
        "Invalid project: expected a numeric id or 'namespace/project', got '{0}'"
    )]
    InvalidProject(String),

    #[error("Invalid ref: {0}")]
    InvalidRef(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid line range: '{0}'. Use formats like '1-80', '50-', or '100' (first N lines).")]
    InvalidLineRange(String),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Content decode error: {0}")]
    Decode(String),
}

/// HTTP client for the GitLab REST API v4.
///
/// Project parameters must come from `parse_project`, which restricts paths to
/// `[a-zA-Z0-9._-]` segments and encodes them as a single URL segment.
#[derive(Clone)]
pub struct GitLabClient {
    http: Client,
    token: Option<Token>,
    base_url: String,
}

impl GitLabClient {
    pub fn new(http: Client, config: &Config) -> Self {
        if config.token.is_some() {
            debug!("GitLab token configured");
        } else {
            warn!("No GitLab token configured. Only public data will be visible.");
        }
        Self {
            http,
            token: config.token.clone(),
            base_url: config.api_url.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            token: None,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str, query: &QueryParams) -> Result<Url, GitLabError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header("Accept", "application/json")
            .header("User-Agent", crate::USER_AGENT);
        if let Some(ref token) = self.token {
            req = req.header("PRIVATE-TOKEN", token.expose());
        }
        req
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, GitLabError> {
        let response = request.send().await?;
        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(response.json().await?),
            404 => Err(GitLabError::NotFound(resource.to_string())),
            429 => Err(GitLabError::RateLimited),
            401 => {
                let message = extract_error_message(&response.text().await.unwrap_or_default());
                Err(GitLabError::Unauthorized(message))
            }
            403 => {
                let remaining = response
                    .headers()
                    .get("ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                if remaining == Some(0) {
                    Err(GitLabError::RateLimited)
                } else {
                    let message =
                        extract_error_message(&response.text().await.unwrap_or_default());
                    Err(GitLabError::Forbidden(message))
                }
            }
            _ => {
                let message = extract_error_message(
                    &response
                        .text()
                        .await
                        .unwrap_or_else(|_| format!("HTTP {status}")),
                );
                Err(GitLabError::Api {
                    code: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
    ) -> Result<T, GitLabError> {
        let url = self.url(path, query)?;
        debug!(%url, "GET");
        self.send_json(self.request(Method::GET, url), path).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitLabError> {
        let url = self.url(path, &[])?;
        debug!(%url, "POST");
        self.send_json(self.request(Method::POST, url).json(body), path)
            .await
    }

    pub async fn list_users(&self, query: &QueryParams) -> Result<Vec<Value>, GitLabError> {
        self.get_json("/users", query).await
    }

    pub async fn get_user(&self, user_id: u64) -> Result<Value, GitLabError> {
        self.get_json(&format!("/users/{user_id}"), &[]).await
    }

    /// `project` must be the output of [`parse_project`].
    pub async fn get_project(&self, project: &str) -> Result<Value, GitLabError> {
        self.get_json(&format!("/projects/{project}"), &[]).await
    }

    pub async fn default_branch(&self, project: &str) -> Result<String, GitLabError> {
        let info: ProjectInfo = self.get_json(&format!("/projects/{project}"), &[]).await?;
        info.default_branch.ok_or_else(|| {
            GitLabError::NotFound(format!(
                "default branch of {} (repository is empty)",
                info.path_with_namespace
            ))
        })
    }

    /// List the full recursive tree at `ref_`. The flag is `true` when the
    /// listing stopped at the page cap before the tree was exhausted.
    pub async fn list_tree(
        &self,
        project: &str,
        ref_: &str,
    ) -> Result<(Vec<TreeEntry>, bool), GitLabError> {
        let path = format!("/projects/{project}/repository/tree");
        let mut entries = Vec::new();
        for page in 1..=MAX_TREE_PAGES {
            let query = [
                ("ref", ref_.to_string()),
                ("recursive", "true".to_string()),
                ("per_page", TREE_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let batch: Vec<TreeEntry> = self.get_json(&path, &query).await?;
            let last = batch.len() < TREE_PAGE_SIZE;
            entries.extend(batch);
            if last {
                return Ok((entries, false));
            }
        }
        warn!(project, pages = MAX_TREE_PAGES, "tree listing truncated");
        Ok((entries, true))
    }

    pub async fn get_file(
        &self,
        project: &str,
        file_path: &str,
        ref_: &str,
    ) -> Result<FileResponse, GitLabError> {
        let file_path = encode_segment(file_path);
        self.get_json(
            &format!("/projects/{project}/repository/files/{file_path}"),
            &[("ref", ref_.to_string())],
        )
        .await
    }

    pub async fn list_commits(
        &self,
        project: &str,
        query: &QueryParams,
    ) -> Result<Vec<Value>, GitLabError> {
        self.get_json(&format!("/projects/{project}/repository/commits"), query)
            .await
    }

    pub async fn list_issues(
        &self,
        project: &str,
        query: &QueryParams,
    ) -> Result<Vec<Value>, GitLabError> {
        self.get_json(&format!("/projects/{project}/issues"), query)
            .await
    }

    pub async fn create_issue(&self, project: &str, issue: &NewIssue) -> Result<Value, GitLabError> {
        self.post_json(&format!("/projects/{project}/issues"), issue)
            .await
    }
}

impl UserDirectory for GitLabClient {
    async fn search_users(&self, params: &QueryParams) -> Result<Vec<Value>, GitLabError> {
        self.list_users(params).await
    }
}

/// Pull a human-readable message out of a GitLab error body.
///
/// GitLab uses `{"message": "..."}`, `{"message": {field: [errors]}}` for validation
/// failures, and `{"error": "...", "error_description": "..."}` for OAuth errors.
fn extract_error_message(body: &str) -> String {
    let Ok(v) = serde_json::from_str::<Value>(body) else {
        return body.chars().take(200).collect();
    };
    match (&v["message"], &v["error_description"], &v["error"]) {
        (Value::String(m), _, _) => m.clone(),
        (m @ (Value::Object(_) | Value::Array(_)), _, _) => m.to_string(),
        (_, Value::String(d), _) => d.clone(),
        (_, _, Value::String(e)) => e.clone(),
        _ => body.chars().take(200).collect(),
    }
}
