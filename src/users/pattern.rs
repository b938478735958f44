use serde::Serialize;

/// GitLab caps usernames at 255 characters.
const MAX_HANDLE_LEN: usize = 255;

/// How a free-form user query is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Email,
    Handle,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedPattern {
    #[serde(rename = "type")]
    pub kind: PatternType,
    pub has_transliteration: bool,
    pub original_query: String,
}

/// Classify a raw query. Total: every string maps to exactly one [`PatternType`].
///
/// Shape checks run on the trimmed query; the non-Latin scan covers the whole string.
pub fn classify(query: &str) -> ClassifiedPattern {
    let trimmed = query.trim();
    let kind = if is_email(trimmed) {
        PatternType::Email
    } else if is_handle(trimmed) {
        PatternType::Handle
    } else {
        PatternType::Name
    };
    ClassifiedPattern {
        kind,
        has_transliteration: !query.is_ascii(),
        original_query: query.to_string(),
    }
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels
            .iter()
            .all(|l| !l.is_empty() && l.chars().all(|c| c.is_alphanumeric() || c == '-'))
        && labels
            .last()
            .is_some_and(|tld| tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic))
}

fn is_handle(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_HANDLE_LEN
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
