//! User resolution: query classification, transliteration, phase planning, and the
//! short-circuiting search cascade against `GET /users`.

mod engine;
mod pattern;
mod plan;
mod translit;

pub use engine::{SearchOutcome, UserDirectory, smart_search};
pub use plan::PassthroughFilters;

use serde_json::Value;
use tracing::info;

use crate::gitlab::GitLabError;
use crate::gitlab::ids::normalize_ids;

/// How a `search_users` call is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Run the cascade for a single free-form query.
    Smart { query: String },
    /// One remote call with the caller's exact field(s).
    Legacy {
        fields: Vec<(&'static str, String)>,
    },
}

/// The lookup fields a caller may supply.
#[derive(Debug, Default, Clone)]
pub struct UserLookup {
    pub username: Option<String>,
    pub public_email: Option<String>,
    pub search: Option<String>,
    /// `Some(true)` forces the cascade, `Some(false)` disables it.
    pub smart_search: Option<bool>,
}

impl UserLookup {
    /// Pick the serving mode. `None` when no lookup field is present.
    ///
    /// Exact fields default to a single call; a lone `search` defaults to the cascade.
    pub fn mode(&self) -> Option<SearchMode> {
        let has_exact = self.username.is_some() || self.public_email.is_some();
        let smart = self.smart_search.unwrap_or(!has_exact);

        if smart {
            let query = self
                .username
                .as_ref()
                .or(self.public_email.as_ref())
                .or(self.search.as_ref())?;
            return Some(SearchMode::Smart {
                query: query.clone(),
            });
        }

        let fields: Vec<_> = [
            ("username", &self.username),
            ("public_email", &self.public_email),
            ("search", &self.search),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect();
        (!fields.is_empty()).then_some(SearchMode::Legacy { fields })
    }
}

/// Single-call lookup with the caller's fields and filters, ids normalized.
pub async fn legacy_search(
    directory: &impl UserDirectory,
    fields: &[(&'static str, String)],
    filters: &PassthroughFilters,
) -> Result<Vec<Value>, GitLabError> {
    let mut params = fields.to_vec();
    params.extend(filters.to_params());
    let users = directory.search_users(&params).await?;
    info!(results = users.len(), "legacy user lookup complete");
    Ok(users.into_iter().map(normalize_ids).collect())
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use crate::gitlab::GitLabClient;
    use reqwest::Client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn smart_search_against_gitlab_stops_on_exact_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("public_email", "jane.doe@example.com"))
            .and(query_param("active", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 11, "username": "jdoe", "name": "Jane Doe"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("search", "jane.doe@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = GitLabClient::with_base_url(Client::new(), &server.uri());
        let filters = PassthroughFilters {
            active: Some(true),
            ..Default::default()
        };
        let outcome = smart_search(&client, "jane.doe@example.com", &filters)
            .await
            .unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.provenance.total_api_calls, 1);
    }

    #[tokio::test]
    async fn smart_search_exhausts_all_phases_for_unknown_handle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(3)
            .mount(&server)
            .await;

        let client = GitLabClient::with_base_url(Client::new(), &server.uri());
        let outcome = smart_search(&client, "zzz_no_such_user", &PassthroughFilters::default())
            .await
            .unwrap();

        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.provenance.phases.len(), 3);
        assert_eq!(outcome.provenance.total_api_calls, 3);
    }

    #[tokio::test]
    async fn smart_search_propagates_http_error_from_first_phase() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitLabClient::with_base_url(Client::new(), &server.uri());
        let err = smart_search(&client, "Jane Doe", &PassthroughFilters::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GitLabError::Api { code: 503, .. }));
    }

    #[tokio::test]
    async fn legacy_search_sends_fields_then_filters_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("username", "jdoe"))
            .and(query_param("blocked", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "gid://gitlab/User/11", "username": "jdoe"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitLabClient::with_base_url(Client::new(), &server.uri());
        let filters = PassthroughFilters {
            blocked: Some(false),
            ..Default::default()
        };
        let users = legacy_search(&client, &[("username", "jdoe".into())], &filters)
            .await
            .unwrap();

        assert_eq!(users, vec![serde_json::json!({"id": 11, "username": "jdoe"})]);
    }
}
