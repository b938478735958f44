use serde::Serialize;

use super::pattern::{ClassifiedPattern, PatternType};

/// GitLab's fuzzy search ignores terms shorter than this.
const MIN_SEARCH_TERM_CHARS: usize = 2;

/// Caller constraints forwarded verbatim into every search phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassthroughFilters {
    pub active: Option<bool>,
    pub blocked: Option<bool>,
    pub exclude_internal: Option<bool>,
    pub without_project_bots: Option<bool>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub per_page: Option<u8>,
    pub page: Option<u32>,
}

impl PassthroughFilters {
    /// Remote query parameters in a fixed order, so every phase carries an
    /// identical filter suffix.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                params.push((key, v));
            }
        };
        push("active", self.active.map(|b| b.to_string()));
        push("blocked", self.blocked.map(|b| b.to_string()));
        push("exclude_internal", self.exclude_internal.map(|b| b.to_string()));
        push(
            "without_project_bots",
            self.without_project_bots.map(|b| b.to_string()),
        );
        push("created_after", self.created_after.clone());
        push("created_before", self.created_before.clone());
        push("per_page", self.per_page.map(|n| n.to_string()));
        push("page", self.page.map(|n| n.to_string()));
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExactEmail,
    ExactUsername,
    FuzzySearch,
    TransliteratedSearch,
    BroadenedSearch,
}

impl Strategy {
    /// The `/users` parameter that carries this strategy's search term.
    fn term_param(self) -> &'static str {
        match self {
            Strategy::ExactEmail => "public_email",
            Strategy::ExactUsername => "username",
            Strategy::FuzzySearch
            | Strategy::TransliteratedSearch
            | Strategy::BroadenedSearch => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPhase {
    pub strategy: Strategy,
    pub term: String,
    pub remote_params: Vec<(&'static str, String)>,
}

/// Build the ordered phase list, highest precision first. Pure; no I/O.
///
/// `candidates` is the transliterator output (original first) and is only
/// consulted for name queries. An empty query plans zero phases.
pub fn plan(
    pattern: &ClassifiedPattern,
    candidates: &[String],
    filters: &PassthroughFilters,
) -> Vec<PlannedPhase> {
    let query = pattern.original_query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let mut steps: Vec<(Strategy, String)> = Vec::new();
    match pattern.kind {
        PatternType::Email => {
            steps.push((Strategy::ExactEmail, query.to_string()));
            steps.push((Strategy::FuzzySearch, query.to_string()));
        }
        PatternType::Handle => {
            steps.push((Strategy::ExactUsername, query.to_string()));
            steps.push((Strategy::FuzzySearch, query.to_string()));
            push_broadened(&mut steps, split_handle(query));
        }
        PatternType::Name => {
            steps.push((Strategy::FuzzySearch, query.to_string()));
            let extra = if pattern.has_transliteration {
                candidates.get(1..).unwrap_or_default()
            } else {
                &[]
            };
            for candidate in extra {
                if !has_term(&steps, candidate) {
                    steps.push((Strategy::TransliteratedSearch, candidate.clone()));
                }
            }
            let latin = extra.first().map_or(query, String::as_str);
            push_broadened(&mut steps, longest_word(latin));
        }
    }

    let suffix = filters.to_params();
    steps
        .into_iter()
        .map(|(strategy, term)| {
            let mut remote_params = Vec::with_capacity(suffix.len() + 1);
            remote_params.push((strategy.term_param(), term.clone()));
            remote_params.extend(suffix.iter().cloned());
            PlannedPhase {
                strategy,
                term,
                remote_params,
            }
        })
        .collect()
}

fn has_term(steps: &[(Strategy, String)], term: &str) -> bool {
    steps.iter().any(|(_, t)| t == term)
}

fn push_broadened(steps: &mut Vec<(Strategy, String)>, term: Option<String>) {
    if let Some(term) = term
        && term.chars().count() >= MIN_SEARCH_TERM_CHARS
        && !has_term(steps, &term)
    {
        steps.push((Strategy::BroadenedSearch, term));
    }
}

/// `jane.doe` → `jane doe`, so display names match a handle-shaped guess.
fn split_handle(handle: &str) -> Option<String> {
    let words: Vec<&str> = handle
        .split(['.', '-', '_'])
        .filter(|w| !w.is_empty())
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}

/// Longest alphanumeric word; ties go to the later word (usually the surname).
fn longest_word(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .max_by_key(|w| w.chars().count())
        .map(str::to_string)
}
