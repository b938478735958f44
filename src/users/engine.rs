use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::pattern::{ClassifiedPattern, classify};
use super::plan::{PassthroughFilters, PlannedPhase, Strategy, plan};
use super::translit;
use crate::gitlab::ids::normalize_ids;
use crate::gitlab::{GitLabError, QueryParams};

/// The remote user-search endpoint.
/// Implemented by `GitLabClient` for production; mock implementations used in tests.
pub trait UserDirectory {
    async fn search_users(&self, params: &QueryParams) -> Result<Vec<Value>, GitLabError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedPhase {
    pub strategy_name: Strategy,
    pub result_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub query: String,
    pub pattern: ClassifiedPattern,
    pub phases: Vec<ExecutedPhase>,
    pub total_api_calls: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub matches: Vec<Value>,
    pub provenance: Provenance,
}

#[derive(Debug)]
pub(crate) struct Execution {
    phases: Vec<ExecutedPhase>,
    matches: Vec<Value>,
}

/// Resolve a free-form query to user accounts via the phase cascade.
///
/// A transport or HTTP failure in any phase aborts the whole search and is
/// returned unchanged; the partial trace is dropped.
pub async fn smart_search(
    directory: &impl UserDirectory,
    query: &str,
    filters: &PassthroughFilters,
) -> Result<SearchOutcome, GitLabError> {
    let pattern = classify(query);
    let candidates = if pattern.has_transliteration {
        translit::candidates(query)
    } else {
        Vec::new()
    };
    let phases = plan(&pattern, &candidates, filters);

    info!(
        kind = ?pattern.kind,
        transliterated = candidates.len().saturating_sub(1),
        planned = phases.len(),
        "user search planned"
    );

    let execution = execute(directory, &phases).await?;
    Ok(assemble(query, pattern, execution))
}

/// Run phases in order, one request each, stopping at the first phase with a match.
pub(crate) async fn execute(
    directory: &impl UserDirectory,
    phases: &[PlannedPhase],
) -> Result<Execution, GitLabError> {
    let mut executed = Vec::with_capacity(phases.len());
    for (i, phase) in phases.iter().enumerate() {
        let users = directory.search_users(&phase.remote_params).await?;
        debug!(
            phase = i + 1,
            strategy = ?phase.strategy,
            term = %phase.term,
            results = users.len(),
            "user search phase"
        );
        executed.push(ExecutedPhase {
            strategy_name: phase.strategy,
            result_count: users.len(),
        });
        if !users.is_empty() {
            return Ok(Execution {
                phases: executed,
                matches: users,
            });
        }
    }
    Ok(Execution {
        phases: executed,
        matches: Vec::new(),
    })
}

pub(crate) fn assemble(query: &str, pattern: ClassifiedPattern, execution: Execution) -> SearchOutcome {
    let matches = dedupe_by_id(execution.matches.into_iter().map(normalize_ids).collect());
    let total_api_calls = execution.phases.len();
    SearchOutcome {
        matches,
        provenance: Provenance {
            query: query.to_string(),
            pattern,
            phases: execution.phases,
            total_api_calls,
        },
    }
}

/// First occurrence wins. Records without an `id` are kept as-is.
fn dedupe_by_id(users: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    users
        .into_iter()
        .filter(|u| match u.get("id") {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .collect()
}
