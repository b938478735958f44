use std::env;
use std::time::Duration;

use clap::Parser;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Checked after `--token` / `GITLAB_PERSONAL_ACCESS_TOKEN`.
const FALLBACK_TOKEN_VAR: &str = "GITLAB_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid GitLab API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("GitLab API URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("timeout must be at least 1 second")]
    ZeroTimeout,
}

/// Command-line interface. Flags fall back to environment variables.
#[derive(Parser, Debug)]
#[command(name = "labscout", version, about)]
pub struct Cli {
    /// Base URL of the GitLab REST API v4 (e.g. https://gitlab.example.com/api/v4)
    #[arg(long, env = "GITLAB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Personal access token. Falls back to GITLAB_TOKEN when unset.
    #[arg(long, env = "GITLAB_PERSONAL_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl Cli {
    /// Resolve the final configuration. This is the only place the process
    /// environment is consulted outside of clap's own `env` handling.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let token = self.token.or_else(|| env::var(FALLBACK_TOKEN_VAR).ok());
        Config::new(&self.api_url, token, Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Connection settings for one GitLab instance, built once at startup and
/// handed to [`crate::gitlab::GitLabClient`].
#[derive(Clone, Debug)]
pub struct Config {
    /// API root without a trailing slash.
    pub api_url: String,
    pub token: Option<Token>,
    pub timeout: Duration,
}

impl Config {
    pub fn new(
        api_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let trimmed = api_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|source| ConfigError::InvalidUrl {
            url: api_url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Token);

        Ok(Self {
            api_url: trimmed.to_string(),
            token,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[test]
    fn trims_trailing_slash() {
        let config = Config::new("https://gitlab.example.com/api/v4/", None, TIMEOUT).unwrap();
        assert_eq!(config.api_url, "https://gitlab.example.com/api/v4");
    }

    #[test]
    fn rejects_unparseable_url() {
        let err = Config::new("not a url", None, TIMEOUT).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = Config::new("ftp://gitlab.example.com", None, TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("ftp"), "got: {err}");
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = Config::new(DEFAULT_API_URL, None, Duration::ZERO).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout));
    }

    #[test]
    fn blank_token_is_treated_as_missing() {
        let config = Config::new(DEFAULT_API_URL, Some("   ".into()), TIMEOUT).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn token_is_trimmed_and_redacted_in_debug() {
        let config = Config::new(DEFAULT_API_URL, Some(" glpat-secret \n".into()), TIMEOUT).unwrap();
        let token = config.token.as_ref().unwrap();
        assert_eq!(token.expose(), "glpat-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("glpat-secret"), "got: {debug}");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn cli_parses_explicit_flags() {
        let cli = Cli::try_parse_from([
            "labscout",
            "--api-url",
            "https://gitlab.example.com/api/v4",
            "--token",
            "abc",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.api_url, "https://gitlab.example.com/api/v4");
        assert_eq!(config.token.unwrap().expose(), "abc");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
