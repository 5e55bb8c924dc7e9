//! Client configuration: API base URL and request timeout.
//! Defaults match the hosted development backend; environment variables override them and
//! CLI flags override the environment.

use std::time::Duration;

use reqwest::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const ENV_API_URL: &str = "COMMISSION_API_URL";
pub const ENV_TIMEOUT_MS: &str = "COMMISSION_API_TIMEOUT_MS";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> AppResult<Self> {
        Ok(Self { base_url: parse_base_url(base_url)?, ..Self::default() })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from `COMMISSION_API_URL` / `COMMISSION_API_TIMEOUT_MS`, keeping defaults for unset vars.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> AppResult<Self> {
        let mut cfg = Self::default();
        if let Some(url) = get(ENV_API_URL).filter(|s| !s.trim().is_empty()) {
            cfg.base_url = parse_base_url(url.trim())?;
        }
        if let Some(ms) = get(ENV_TIMEOUT_MS).filter(|s| !s.trim().is_empty()) {
            cfg.timeout = parse_timeout_ms(&ms)?;
        }
        Ok(cfg)
    }
}

pub fn parse_base_url(s: &str) -> AppResult<Url> {
    let url = Url::parse(s).map_err(|e| AppError::Validation {
        code: "invalid_base_url".into(),
        message: format!("invalid API base URL '{}': {}", s, e),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Validation {
            code: "invalid_base_url".into(),
            message: format!("unsupported URL scheme '{}'", other),
        }),
    }
}

pub fn parse_timeout_ms(s: &str) -> AppResult<Duration> {
    match s.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(AppError::Validation {
            code: "invalid_timeout".into(),
            message: format!("timeout must be a positive number of milliseconds, got '{}'", s),
        }),
    }
}
