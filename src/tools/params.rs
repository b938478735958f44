use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema, Default)]
pub struct SearchUsersParams {
    /// Exact username (handle). Uses a single exact lookup unless smart_search is true.
    pub username: Option<String>,
    /// Exact public email. Uses a single exact lookup unless smart_search is true.
    pub public_email: Option<String>,
    /// Free-form text: a name, handle, or email. Resolved with smart search by default.
    pub search: Option<String>,
    /// Force (true) or disable (false) the smart search cascade
    pub smart_search: Option<bool>,
    /// Only active users
    pub active: Option<bool>,
    /// Only blocked users
    pub blocked: Option<bool>,
    /// Exclude internal users (ghost, support bot, etc.)
    pub exclude_internal: Option<bool>,
    /// Exclude project and group bot accounts
    pub without_project_bots: Option<bool>,
    /// Only users created after this ISO 8601 date-time
    pub created_after: Option<String>,
    /// Only users created before this ISO 8601 date-time
    pub created_before: Option<String>,
    /// Results per page (1-100)
    pub per_page: Option<u8>,
    /// Page number (1-based)
    pub page: Option<u32>,
}

#[derive(Deserialize, JsonSchema)]
pub struct GetUserParams {
    /// Numeric user id
    pub user_id: u64,
}

#[derive(Deserialize, JsonSchema)]
pub struct ProjectParams {
    /// Project id or path, e.g. "gitlab-org/gitlab" or "278964"
    pub project: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct RepositoryTreeParams {
    /// Project id or path, e.g. "gitlab-org/gitlab" or "278964"
    pub project: String,
    /// Git ref: branch name, tag, or commit SHA (default: project's default branch)
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    /// Filter to files under this path prefix (e.g., "app/models/")
    pub path: Option<String>,
    /// Glob pattern to filter filenames (e.g., "*.rb", "*.{ts,tsx}")
    pub pattern: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct FileContentsParams {
    /// Project id or path, e.g. "gitlab-org/gitlab" or "278964"
    pub project: String,
    /// File path within the repository (e.g., "app/models/user.rb")
    pub path: String,
    /// Git ref: branch name, tag, or commit SHA (default: project's default branch)
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    /// Line range: "1-80" (lines 1 to 80), "50-" (line 50 to end), "100" (first 100 lines). Omit to read entire file.
    pub lines: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct ListCommitsParams {
    /// Project id or path, e.g. "gitlab-org/gitlab" or "278964"
    pub project: String,
    /// Branch, tag, or SHA to list from (default: project's default branch)
    pub ref_name: Option<String>,
    /// Only commits after this ISO 8601 date-time
    pub since: Option<String>,
    /// Only commits before this ISO 8601 date-time
    pub until: Option<String>,
    /// Only commits touching this file path
    pub path: Option<String>,
    /// Only commits by this author (name or email)
    pub author: Option<String>,
    /// Results per page (1-100, default 20)
    pub per_page: Option<u8>,
    /// Page number (1-based)
    pub page: Option<u32>,
}

#[derive(Deserialize, JsonSchema, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Opened,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueState::Opened => "opened",
            IssueState::Closed => "closed",
            IssueState::All => "all",
        }
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct ListIssuesParams {
    /// Project id or path, e.g. "gitlab-org/gitlab" or "278964"
    pub project: String,
    /// "opened", "closed", or "all" (default: all)
    pub state: Option<IssueState>,
    /// Comma-separated label names; issues must have all of them
    pub labels: Option<String>,
    /// Search issue titles and descriptions
    pub search: Option<String>,
    /// Only issues assigned to this username
    pub assignee_username: Option<String>,
    /// Only issues created by this username
    pub author_username: Option<String>,
    /// Results per page (1-100, default 20)
    pub per_page: Option<u8>,
    /// Page number (1-based)
    pub page: Option<u32>,
}

#[derive(Deserialize, JsonSchema)]
pub struct CreateIssueParams {
    /// Project id or path, e.g. "gitlab-org/gitlab" or "278964"
    pub project: String,
    /// Issue title
    pub title: String,
    /// Issue description (Markdown)
    pub description: Option<String>,
    /// Label names to apply
    pub labels: Option<Vec<String>>,
    /// Numeric ids of users to assign
    pub assignee_ids: Option<Vec<u64>>,
    /// Create the issue as confidential
    pub confidential: Option<bool>,
}
