mod errors;
mod params;

pub use params::{
    CreateIssueParams, FileContentsParams, GetUserParams, IssueState, ListCommitsParams,
    ListIssuesParams, ProjectParams, RepositoryTreeParams, SearchUsersParams,
};

use std::time::Duration;

use reqwest::Client;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use errors::{gitlab_to_mcp_error, parse_project_param};

use crate::config::Config;
use crate::gitlab::{self, GitLabClient, ids::normalize_ids, types::NewIssue};
use crate::users::{self, PassthroughFilters, SearchMode, UserLookup};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PER_PAGE: u8 = 20;
const MAX_FILE_OUTPUT_CHARS: usize = 100_000;

/// MCP server handler exposing GitLab data to agents.
#[derive(Clone)]
pub struct LabScout {
    gitlab: GitLabClient,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LabScout {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            gitlab: GitLabClient::new(http, config),
            tool_router: Self::tool_router(),
        })
    }

    async fn resolve_ref(&self, project: &str, ref_: Option<String>) -> Result<String, McpError> {
        match ref_ {
            Some(r) => {
                gitlab::validate_ref(&r).map_err(gitlab_to_mcp_error)?;
                Ok(r)
            }
            None => self
                .gitlab
                .default_branch(project)
                .await
                .map_err(gitlab_to_mcp_error),
        }
    }

    #[tool(
        name = "search_users",
        description = "Find GitLab users. Pass free-form text in `search` (a name, username, or email, in any script) and smart search tries exact email/username lookups, fuzzy search, transliterated and broadened searches in order, stopping at the first hit. The response includes `provenance` listing every strategy tried. Passing `username` or `public_email` performs a single exact lookup unless `smart_search` is true."
    )]
    async fn search_users(
        &self,
        Parameters(params): Parameters<SearchUsersParams>,
    ) -> Result<CallToolResult, McpError> {
        let lookup = UserLookup {
            username: params.username,
            public_email: params.public_email,
            search: params.search,
            smart_search: params.smart_search,
        };
        let Some(mode) = lookup.mode() else {
            return Err(McpError::invalid_params(
                "one of username, public_email, or search is required",
                None,
            ));
        };
        let filters = PassthroughFilters {
            active: params.active,
            blocked: params.blocked,
            exclude_internal: params.exclude_internal,
            without_project_bots: params.without_project_bots,
            created_after: params.created_after,
            created_before: params.created_before,
            per_page: gitlab::clamp_per_page(params.per_page),
            page: params.page,
        };

        match mode {
            SearchMode::Smart { query } => {
                info!(%query, "tool:search_users (smart)");
                let outcome = users::smart_search(&self.gitlab, &query, &filters)
                    .await
                    .map_err(gitlab_to_mcp_error)?;
                info!(
                    matches = outcome.matches.len(),
                    api_calls = outcome.provenance.total_api_calls,
                    "search_users complete"
                );
                json_result(&outcome)
            }
            SearchMode::Legacy { fields } => {
                info!(fields = fields.len(), "tool:search_users (legacy)");
                let found = users::legacy_search(&self.gitlab, &fields, &filters)
                    .await
                    .map_err(gitlab_to_mcp_error)?;
                json_result(&found)
            }
        }
    }

    #[tool(
        name = "get_user",
        description = "Get a GitLab user's profile by numeric id."
    )]
    async fn get_user(
        &self,
        Parameters(params): Parameters<GetUserParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(user_id = params.user_id, "tool:get_user");
        let user = self
            .gitlab
            .get_user(params.user_id)
            .await
            .map_err(gitlab_to_mcp_error)?;
        json_result(&normalize_ids(user))
    }

    #[tool(
        name = "get_project",
        description = "Get GitLab project metadata (description, default branch, visibility, star/fork counts, URLs) by id or path."
    )]
    async fn get_project(
        &self,
        Parameters(params): Parameters<ProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = parse_project_param(&params.project)?;
        info!(project = %params.project, "tool:get_project");
        let info = self
            .gitlab
            .get_project(&project)
            .await
            .map_err(gitlab_to_mcp_error)?;
        json_result(&normalize_ids(info))
    }

    #[tool(
        name = "list_repository_tree",
        description = "List files in a GitLab repository. Returns file paths with optional path prefix and glob pattern filtering. Use this to explore a repository's structure before reading specific files."
    )]
    async fn list_repository_tree(
        &self,
        Parameters(params): Parameters<RepositoryTreeParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = parse_project_param(&params.project)?;
        info!(project = %params.project, "tool:list_repository_tree");

        if let Some(ref p) = params.path {
            gitlab::validate_path(p).map_err(gitlab_to_mcp_error)?;
        }
        let ref_ = self.resolve_ref(&project, params.ref_).await?;

        let (entries, truncated) = self
            .gitlab
            .list_tree(&project, &ref_)
            .await
            .map_err(gitlab_to_mcp_error)?;
        let files = gitlab::filter_tree_entries(
            &entries,
            params.path.as_deref(),
            params.pattern.as_deref(),
        )
        .map_err(gitlab_to_mcp_error)?;

        info!(files = files.len(), truncated, "list_repository_tree complete");
        json_result(&TreeListing {
            project: &params.project,
            ref_: &ref_,
            truncated,
            files: files.iter().map(|e| e.path.as_str()).collect(),
        })
    }

    #[tool(
        name = "get_file_contents",
        description = "Read a file from a GitLab repository. Returns numbered lines with optional line range selection (e.g., '1-80', '50-', '100')."
    )]
    async fn get_file_contents(
        &self,
        Parameters(params): Parameters<FileContentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = parse_project_param(&params.project)?;
        info!(project = %params.project, path = %params.path, "tool:get_file_contents");

        gitlab::validate_path(&params.path).map_err(gitlab_to_mcp_error)?;
        let range = params
            .lines
            .as_deref()
            .map(gitlab::parse_line_range)
            .transpose()
            .map_err(gitlab_to_mcp_error)?;
        let ref_ = self.resolve_ref(&project, params.ref_).await?;

        let file = self
            .gitlab
            .get_file(&project, &params.path, &ref_)
            .await
            .map_err(gitlab_to_mcp_error)?;
        if file.encoding != "base64" {
            return Err(McpError::internal_error(
                format!("unsupported file encoding '{}'", file.encoding),
                None,
            ));
        }
        let raw = gitlab::decode_content(&file.content).map_err(gitlab_to_mcp_error)?;

        let total = raw.lines().count();
        let (start, end) = range.unwrap_or((1, None));
        let content = gitlab::apply_line_range(&raw, start, end);

        let mut output = format!(
            "{} @ {} ({total} lines, {} bytes)\n\n{content}",
            file.file_path, file.ref_, file.size
        );
        if output.len() > MAX_FILE_OUTPUT_CHARS {
            let cut = output.floor_char_boundary(MAX_FILE_OUTPUT_CHARS);
            output.truncate(cut);
            output.push_str("\n\n(truncated; request a line range)");
        }

        info!(path = %params.path, lines = total, "get_file_contents complete");
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "list_commits",
        description = "List commits in a GitLab repository, newest first. Filter by ref, date range, file path, or author."
    )]
    async fn list_commits(
        &self,
        Parameters(params): Parameters<ListCommitsParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = parse_project_param(&params.project)?;
        info!(project = %params.project, "tool:list_commits");

        if let Some(ref r) = params.ref_name {
            gitlab::validate_ref(r).map_err(gitlab_to_mcp_error)?;
        }
        if let Some(ref p) = params.path {
            gitlab::validate_path(p).map_err(gitlab_to_mcp_error)?;
        }

        let mut query = Vec::new();
        push_opt(&mut query, "ref_name", params.ref_name);
        push_opt(&mut query, "since", params.since);
        push_opt(&mut query, "until", params.until);
        push_opt(&mut query, "path", params.path);
        push_opt(&mut query, "author", params.author);
        push_page(&mut query, params.per_page, params.page);

        let commits = self
            .gitlab
            .list_commits(&project, &query)
            .await
            .map_err(gitlab_to_mcp_error)?;
        info!(commits = commits.len(), "list_commits complete");
        json_result(&normalize_ids(Value::Array(commits)))
    }

    #[tool(
        name = "list_issues",
        description = "List issues in a GitLab project. Filter by state, labels, text search, assignee, or author."
    )]
    async fn list_issues(
        &self,
        Parameters(params): Parameters<ListIssuesParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = parse_project_param(&params.project)?;
        info!(project = %params.project, "tool:list_issues");

        let mut query = Vec::new();
        push_opt(&mut query, "state", params.state.map(IssueState::as_str));
        push_opt(&mut query, "labels", params.labels);
        push_opt(&mut query, "search", params.search);
        push_opt(&mut query, "assignee_username", params.assignee_username);
        push_opt(&mut query, "author_username", params.author_username);
        push_page(&mut query, params.per_page, params.page);

        let issues = self
            .gitlab
            .list_issues(&project, &query)
            .await
            .map_err(gitlab_to_mcp_error)?;
        info!(issues = issues.len(), "list_issues complete");
        json_result(&normalize_ids(Value::Array(issues)))
    }

    #[tool(
        name = "create_issue",
        description = "Create an issue in a GitLab project. Returns the created issue including its iid and web_url."
    )]
    async fn create_issue(
        &self,
        Parameters(params): Parameters<CreateIssueParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.title.trim().is_empty() {
            return Err(McpError::invalid_params("title must not be empty", None));
        }
        let project = parse_project_param(&params.project)?;
        info!(project = %params.project, "tool:create_issue");

        let issue = NewIssue {
            title: params.title,
            description: params.description,
            labels: params.labels.map(|l| l.join(",")),
            assignee_ids: params.assignee_ids,
            confidential: params.confidential,
        };
        let created = self
            .gitlab
            .create_issue(&project, &issue)
            .await
            .map_err(gitlab_to_mcp_error)?;
        info!(iid = %created["iid"], "create_issue complete");
        json_result(&normalize_ids(created))
    }
}

#[tool_handler]
impl ServerHandler for LabScout {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "labscout".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "labscout exposes a GitLab instance: user resolution (search_users, get_user), projects (get_project), repository files (list_repository_tree, get_file_contents), commits (list_commits), and issues (list_issues, create_issue)."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct TreeListing<'a> {
    project: &'a str,
    #[serde(rename = "ref")]
    ref_: &'a str,
    truncated: bool,
    files: Vec<&'a str>,
}

fn json_result(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("failed to encode response: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn push_opt(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<impl Into<String>>) {
    if let Some(v) = value {
        query.push((key, v.into()));
    }
}

fn push_page(query: &mut Vec<(&'static str, String)>, per_page: Option<u8>, page: Option<u32>) {
    let per_page = gitlab::clamp_per_page(per_page).unwrap_or(DEFAULT_PER_PAGE);
    query.push(("per_page", per_page.to_string()));
    push_opt(query, "page", page.map(|p| p.to_string()));
}
