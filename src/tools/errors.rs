use rmcp::ErrorData as McpError;

use crate::gitlab::{self, GitLabError};

pub(super) fn parse_project_param(project: &str) -> Result<String, McpError> {
    gitlab::parse_project(project).map_err(gitlab_to_mcp_error)
}

pub(super) fn retriable_error(e: &impl std::fmt::Display) -> McpError {
    McpError::internal_error(format!("{e} (retriable)"), None)
}

pub(super) fn gitlab_to_mcp_error(e: GitLabError) -> McpError {
    match &e {
        GitLabError::NotFound(_)
        | GitLabError::InvalidProject(_)
        | GitLabError::InvalidRef(_)
        | GitLabError::InvalidPath(_)
        | GitLabError::InvalidLineRange(_)
        | GitLabError::InvalidPattern(_) => McpError::invalid_params(e.to_string(), None),
        GitLabError::RateLimited => retriable_error(&e),
        GitLabError::Api { code: 500..=599, .. } | GitLabError::Network(_) => retriable_error(&e),
        GitLabError::Unauthorized(_) | GitLabError::Forbidden(_) => McpError::internal_error(
            format!("{e} (check GITLAB_PERSONAL_ACCESS_TOKEN and its scopes)"),
            None,
        ),
        _ => McpError::internal_error(e.to_string(), None),
    }
}
