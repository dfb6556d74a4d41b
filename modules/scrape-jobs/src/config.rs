use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::poller::PollConfig;

/// Runtime configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Backend base URL, e.g. `http://localhost:8000/api`.
    pub api_url: String,
    pub api_token: Option<String>,
    /// Default project for CLI runs. The lifecycle itself never reads it.
    pub project_id: Option<i64>,
    pub http_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_max_duration: Duration,
    pub poll_max_attempts: Option<u32>,
}

impl ScrapeConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("SCRAPY_API_URL")
            .filter(|v| !v.trim().is_empty())
            .context("SCRAPY_API_URL environment variable is required")?;

        let config = Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            api_token: lookup("SCRAPY_API_TOKEN").filter(|v| !v.is_empty()),
            project_id: parse_opt(&lookup, "SCRAPY_PROJECT_ID")?,
            http_timeout: Duration::from_secs(
                parse_opt(&lookup, "SCRAPY_HTTP_TIMEOUT_SECS")?.unwrap_or(30),
            ),
            poll_interval: Duration::from_millis(
                parse_opt(&lookup, "SCRAPY_POLL_INTERVAL_MS")?.unwrap_or(3_000),
            ),
            poll_max_duration: Duration::from_millis(
                parse_opt(&lookup, "SCRAPY_POLL_MAX_DURATION_MS")?.unwrap_or(600_000),
            ),
            poll_max_attempts: parse_opt(&lookup, "SCRAPY_POLL_MAX_ATTEMPTS")?,
        };
        Ok(config)
    }

    pub fn poll_config(&self) -> PollConfig {
        let config = PollConfig::default()
            .with_interval(self.poll_interval)
            .with_max_duration(self.poll_max_duration);
        match self.poll_max_attempts {
            Some(max) => config.with_max_attempts(max),
            None => config,
        }
    }

    /// The token as it may appear in logs: presence only, never content.
    pub fn redacted_token(&self) -> &'static str {
        match self.api_token {
            Some(_) => "(set)",
            None => "(none)",
        }
    }

    pub fn log_redacted(&self) {
        info!(
            api_url = self.api_url.as_str(),
            api_token = self.redacted_token(),
            project_id = ?self.project_id,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            poll_max_duration_ms = self.poll_max_duration.as_millis() as u64,
            poll_max_attempts = ?self.poll_max_attempts,
            "Loaded configuration"
        );
    }
}

fn parse_opt<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ScrapeConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ScrapeConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[("SCRAPY_API_URL", "http://localhost:8000/api/")]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert_eq!(config.api_token, None);
        assert_eq!(config.poll_config(), PollConfig::default());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn api_url_is_required() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("SCRAPY_API_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("SCRAPY_API_URL", "http://api"),
            ("SCRAPY_API_TOKEN", "abcdef"),
            ("SCRAPY_PROJECT_ID", "9"),
            ("SCRAPY_POLL_INTERVAL_MS", "1000"),
            ("SCRAPY_POLL_MAX_DURATION_MS", "5000"),
            ("SCRAPY_POLL_MAX_ATTEMPTS", "7"),
        ])
        .unwrap();
        assert_eq!(config.project_id, Some(9));
        let poll = config.poll_config();
        assert_eq!(poll.interval, Duration::from_secs(1));
        assert_eq!(poll.max_duration, Duration::from_secs(5));
        assert_eq!(poll.max_attempts, Some(7));
    }

    #[test]
    fn token_is_never_logged() {
        let with = config(&[
            ("SCRAPY_API_URL", "http://api"),
            ("SCRAPY_API_TOKEN", "sk-live-abcdef"),
        ])
        .unwrap();
        assert_eq!(with.redacted_token(), "(set)");

        let without = config(&[("SCRAPY_API_URL", "http://api")]).unwrap();
        assert_eq!(without.redacted_token(), "(none)");
    }

    #[test]
    fn bad_number_is_an_error() {
        let err = config(&[
            ("SCRAPY_API_URL", "http://api"),
            ("SCRAPY_POLL_INTERVAL_MS", "soon"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("SCRAPY_POLL_INTERVAL_MS"));
    }
}
