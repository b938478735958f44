use serde::{Deserialize, Serialize};

/// The subset of `GET /projects/:id` needed to resolve a default ref.
#[derive(Deserialize, Debug)]
pub struct ProjectInfo {
    pub path_with_namespace: String,
    pub default_branch: Option<String>,
}

/// Git object type. `Other` captures unknown types via `#[serde(other)]` for forward compat.
#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Blob,
    Tree,
    Commit,
    #[serde(other)]
    Other,
}

/// A single entry from `GET /projects/:id/repository/tree`.
#[derive(Deserialize, Debug, Clone)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

/// Response from `GET /projects/:id/repository/files/:file_path`.
#[derive(Deserialize, Debug)]
pub struct FileResponse {
    pub file_path: String,
    pub size: u64,
    pub encoding: String,
    pub content: String,
    #[serde(rename = "ref")]
    pub ref_: String,
}

/// Body of `POST /projects/:id/issues`.
#[derive(Serialize, Debug, Default)]
pub struct NewIssue {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Comma-separated label names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidential: Option<bool>,
}
