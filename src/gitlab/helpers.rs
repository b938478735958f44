use base64::{Engine as _, engine::general_purpose::STANDARD};
use globset::Glob;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use super::GitLabError;
use super::types::{EntryType, TreeEntry};

/// Characters to percent-encode when a value is embedded as a single URL path segment.
/// GitLab addresses projects and files by their full path with `/` encoded as `%2F`.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b';')
    .add(b'=')
    .add(b'"');

pub(super) fn encode_segment(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT_ENCODE_SET).to_string()
}

pub const MAX_PER_PAGE: u8 = 100;

/// Clamp a caller-supplied page size to what the GitLab API accepts.
pub fn clamp_per_page(per_page: Option<u8>) -> Option<u8> {
    per_page.map(|n| n.clamp(1, MAX_PER_PAGE))
}

fn is_valid_path_component(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && s != ".."
        && s != "."
}

/// Parse a project reference into the URL-encoded form GitLab expects in `/projects/:id`.
///
/// Accepts a numeric id, `"namespace/project"` (nested groups allowed), and full
/// project URLs including `.git` and `/-/tree/...` style suffixes.
pub fn parse_project(project: &str) -> Result<String, GitLabError> {
    let invalid = || GitLabError::InvalidProject(project.to_string());
    let trimmed = project.trim();

    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Ok(trimmed.to_string());
    }

    let without_host = match trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
    {
        Some(rest) => rest.split_once('/').map(|(_, path)| path).ok_or_else(invalid)?,
        None => trimmed,
    };
    let path = without_host
        .split_once("/-/")
        .map_or(without_host, |(path, _)| path)
        .trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 || !segments.iter().all(|s| is_valid_path_component(s)) {
        return Err(invalid());
    }
    Ok(encode_segment(path))
}

/// Validate a git ref (branch, tag, or SHA).
///
/// Rejects empty, control characters, and `..` sequences (git-check-ref-format).
pub fn validate_ref(ref_: &str) -> Result<(), GitLabError> {
    if ref_.is_empty() || ref_.contains(['\0', '\n', '\r']) || ref_.contains("..") {
        return Err(GitLabError::InvalidRef(ref_.to_string()));
    }
    Ok(())
}

/// Validate a file path within a repository.
///
/// Rejects empty, absolute paths, control characters, and `..` path traversal.
pub fn validate_path(path: &str) -> Result<(), GitLabError> {
    if path.is_empty()
        || path.starts_with('/')
        || path.contains(['\0', '\n', '\r'])
        || path.split('/').any(|s| s == "..")
    {
        return Err(GitLabError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Decode base64-encoded content from the repository files API.
pub fn decode_content(encoded: &str) -> Result<String, GitLabError> {
    let clean: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(&clean)
        .map_err(|e| GitLabError::Decode(e.to_string()))?;
    String::from_utf8(bytes)
        .map_err(|_| GitLabError::Decode("file appears to be binary (not valid UTF-8)".into()))
}

/// Parse a line range string: `"1-80"` (range), `"50-"` (open end), `"100"` (first N lines).
pub fn parse_line_range(range: &str) -> Result<(usize, Option<usize>), GitLabError> {
    let range = range.trim();
    let err = || GitLabError::InvalidLineRange(range.to_string());

    if range.is_empty() {
        return Err(err());
    }

    if let Some((start, end)) = range.split_once('-') {
        let start: usize = start.trim().parse().map_err(|_| err())?;
        if start == 0 {
            return Err(err());
        }
        if end.trim().is_empty() {
            Ok((start, None))
        } else {
            let end: usize = end.trim().parse().map_err(|_| err())?;
            if end < start {
                return Err(err());
            }
            Ok((start, Some(end)))
        }
    } else {
        let n: usize = range.parse().map_err(|_| err())?;
        if n == 0 {
            return Err(err());
        }
        Ok((1, Some(n)))
    }
}

/// Extract a line range from content, returning numbered lines.
pub fn apply_line_range(content: &str, start: usize, end: Option<usize>) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len();
    let start_idx = start.saturating_sub(1);
    let end_idx = end.map(|e| e.min(total)).unwrap_or(total);

    if start_idx >= total {
        return format!("(file has {total} lines, requested start at {start})");
    }

    lines[start_idx..end_idx]
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>5}\t{}", start_idx + i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Filter tree entries to blobs matching an optional path prefix and glob pattern.
pub fn filter_tree_entries<'a>(
    entries: &'a [TreeEntry],
    path: Option<&str>,
    pattern: Option<&str>,
) -> Result<Vec<&'a TreeEntry>, GitLabError> {
    let matcher = pattern
        .map(|p| {
            Glob::new(p)
                .map_err(|e| GitLabError::InvalidPattern(e.to_string()))
                .map(|g| g.compile_matcher())
        })
        .transpose()?;

    Ok(entries
        .iter()
        .filter(|e| e.entry_type == EntryType::Blob)
        .filter(|e| path.is_none_or(|prefix| e.path.starts_with(prefix)))
        .filter(|e| {
            matcher.as_ref().is_none_or(|m| {
                let filename = e.path.rsplit('/').next().unwrap_or(&e.path);
                m.is_match(filename)
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.into(),
            entry_type: EntryType::Blob,
        }
    }

    fn tree(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.into(),
            entry_type: EntryType::Tree,
        }
    }

    #[test]
    fn parse_project_numeric_id_passes_through() {
        assert_eq!(parse_project("278964").unwrap(), "278964");
    }

    #[test]
    fn parse_project_encodes_namespace_path() {
        assert_eq!(
            parse_project("gitlab-org/gitlab").unwrap(),
            "gitlab-org%2Fgitlab"
        );
    }

    #[test]
    fn parse_project_keeps_nested_groups() {
        assert_eq!(
            parse_project("group/sub.group/my_project").unwrap(),
            "group%2Fsub.group%2Fmy_project"
        );
    }

    #[test]
    fn parse_project_strips_url_and_suffixes() {
        assert_eq!(
            parse_project("https://gitlab.com/gitlab-org/gitlab.git").unwrap(),
            "gitlab-org%2Fgitlab"
        );
        assert_eq!(
            parse_project("https://gitlab.example.com/team/app/-/tree/main/src").unwrap(),
            "team%2Fapp"
        );
    }

    #[test]
    fn parse_project_rejects_bad_input() {
        assert!(parse_project("").is_err());
        assert!(parse_project("single").is_err());
        assert!(parse_project("../secret").is_err());
        assert!(parse_project("group/proj?x=1").is_err());
        assert!(parse_project("https://gitlab.com").is_err());
    }

    #[test]
    fn encode_segment_encodes_slashes_and_delimiters() {
        assert_eq!(encode_segment("src/lib.rs"), "src%2Flib.rs");
        assert_eq!(encode_segment("a b?c#d"), "a%20b%3Fc%23d");
        assert_eq!(encode_segment("100%"), "100%25");
    }

    #[test]
    fn encode_segment_handles_non_ascii() {
        let encoded = encode_segment("docs/日本語.md");
        assert!(encoded.starts_with("docs%2F"));
        assert!(!encoded.contains("日本語"));
    }

    #[test]
    fn clamp_per_page_bounds() {
        assert_eq!(clamp_per_page(Some(0)), Some(1));
        assert_eq!(clamp_per_page(Some(250)), Some(100));
        assert_eq!(clamp_per_page(Some(20)), Some(20));
        assert_eq!(clamp_per_page(None), None);
    }

    #[test]
    fn validate_ref_accepts_branch_with_slash() {
        assert!(validate_ref("feature/my-branch").is_ok());
    }

    #[test]
    fn validate_ref_rejects_bad_refs() {
        assert!(validate_ref("").is_err());
        assert!(validate_ref("main\0").is_err());
        assert!(validate_ref("main..develop").is_err());
    }

    #[test]
    fn validate_path_rejects_traversal_and_absolute() {
        assert!(validate_path("").is_err());
        assert!(validate_path("/etc/passwd").is_err());
        assert!(validate_path("src/../../secret").is_err());
    }

    #[test]
    fn validate_path_allows_dots_in_filenames() {
        assert!(validate_path(".gitlab-ci.yml").is_ok());
        assert!(validate_path("path/to/file..name").is_ok());
    }

    #[test]
    fn parse_line_range_forms() {
        assert_eq!(parse_line_range("1-80").unwrap(), (1, Some(80)));
        assert_eq!(parse_line_range("50-").unwrap(), (50, None));
        assert_eq!(parse_line_range("100").unwrap(), (1, Some(100)));
    }

    #[test]
    fn parse_line_range_rejects_invalid() {
        assert!(parse_line_range("0").is_err());
        assert!(parse_line_range("0-10").is_err());
        assert!(parse_line_range("80-1").is_err());
        assert!(parse_line_range("abc").is_err());
    }

    #[test]
    fn apply_line_range_subset() {
        let content = "line1\nline2\nline3\nline4\nline5";
        let result = apply_line_range(content, 2, Some(4));
        assert_eq!(result, "    2\tline2\n    3\tline3\n    4\tline4");
    }

    #[test]
    fn apply_line_range_beyond_file() {
        let result = apply_line_range("line1\nline2", 5, None);
        assert!(result.contains("2 lines"));
    }

    #[test]
    fn decode_content_with_newlines() {
        let encoded = "aGVs\nbG8g\nd29y\nbGQ=\n";
        assert_eq!(decode_content(encoded).unwrap(), "hello world");
    }

    #[test]
    fn decode_content_rejects_binary() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0x00]);
        let err = decode_content(&encoded).unwrap_err();
        assert!(err.to_string().contains("binary"));
    }

    #[test]
    fn filter_by_path_prefix_skips_trees() {
        let entries = vec![blob("src/main.rs"), blob("tests/it.rs"), tree("src")];
        let filtered = filter_tree_entries(&entries, Some("src/"), None).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].path, "src/main.rs");
    }

    #[test]
    fn filter_by_glob_pattern() {
        let entries = vec![blob("src/main.rs"), blob("src/lib.ts"), blob("README.md")];
        let filtered = filter_tree_entries(&entries, None, Some("*.rs")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].path, "src/main.rs");
    }

    #[test]
    fn filter_rejects_invalid_glob() {
        let entries = vec![blob("a.rs")];
        let err = filter_tree_entries(&entries, None, Some("[")).unwrap_err();
        assert!(matches!(err, GitLabError::InvalidPattern(_)));
    }
}
