// Configuration management module
// This file loads client settings from the environment and resolves the backend
// base URL from an explicit override, the hosting page's location, or a local fallback
//
// Numan Thabit 2025 Nov

use crate::cache::QueryOptions;
use crate::errors::ClientError;
use crate::transport::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const ENV_PREFIX: &str = "TRANSFER";
pub const DEFAULT_BACKEND_PORT: u16 = 8080;
pub const DEFAULT_API_PATH: &str = "/api";
pub const FALLBACK_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Explicit backend base URL, used verbatim, e.g. http://10.0.0.2:8080/api
    pub api_base_url: Option<String>,
    /// Location of the page hosting the client, when there is one
    pub page: Option<PageLocation>,
    #[serde(default = "default_backend_port")]
    pub backend_port: u16,
    #[serde(default = "default_api_path")]
    pub api_path: String,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-attempt bound; a hung request fails after this and counts as transient
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,
    #[serde(default = "default_gc_time_secs")]
    pub gc_time_secs: u64,
    /// Router base path, e.g. /app
    pub base_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageLocation {
    /// Scheme with or without the trailing colon ("http:" or "http"); empty means http
    #[serde(default)]
    pub protocol: String,
    pub hostname: String,
}

impl PageLocation {
    pub fn new(protocol: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            hostname: hostname.into(),
        }
    }

    /// Scheme and host of an origin such as `http://192.168.1.5:5173`.
    pub fn from_origin(origin: &str) -> Result<Self, ClientError> {
        let url = Url::parse(origin)?;
        let hostname = url
            .host_str()
            .ok_or_else(|| ClientError::InvalidUrl(format!("origin without host: {origin}")))?;
        Ok(Self::new(url.scheme(), hostname))
    }
}

fn default_backend_port() -> u16 {
    DEFAULT_BACKEND_PORT
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_retry_attempts() -> u32 {
    crate::transport::DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    crate::transport::DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_request_timeout_secs() -> u64 {
    crate::transport::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_stale_time_secs() -> u64 {
    QueryOptions::default().stale_time.as_secs()
}

fn default_gc_time_secs() -> u64 {
    QueryOptions::default().gc_time.as_secs()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            page: None,
            backend_port: default_backend_port(),
            api_path: default_api_path(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            stale_time_secs: default_stale_time_secs(),
            gc_time_secs: default_gc_time_secs(),
            base_path: None,
        }
    }
}

impl AppConfig {
    /// Read `TRANSFER_*` variables; nested keys use `__`, e.g. `TRANSFER_PAGE__HOSTNAME`.
    pub fn load() -> Result<Self, ClientError> {
        Self::from_environment(Self::environment())
    }

    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self, ClientError> {
        Self::from_environment(Self::environment().source(Some(vars)))
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    fn from_environment(env: config::Environment) -> Result<Self, ClientError> {
        let cfg = config::Config::builder().add_source(env).build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn base_url(&self) -> Result<Url, ClientError> {
        resolve_base_url(
            self.api_base_url.as_deref(),
            self.page.as_ref(),
            self.backend_port,
            &self.api_path,
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            stale_time: Duration::from_secs(self.stale_time_secs),
            gc_time: Duration::from_secs(self.gc_time_secs),
        }
    }
}

/// Override first, then the page's host on the backend port, then localhost.
pub fn resolve_base_url(
    override_url: Option<&str>,
    page: Option<&PageLocation>,
    backend_port: u16,
    api_path: &str,
) -> Result<Url, ClientError> {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(Url::parse(url)?);
    }

    if let Some(page) = page.filter(|p| !p.hostname.trim().is_empty()) {
        let scheme = page.protocol.trim().trim_end_matches(':');
        let scheme = if scheme.is_empty() { "http" } else { scheme };
        let path = format!("/{}", api_path.trim_matches('/'));
        let derived = format!(
            "{scheme}://{}:{backend_port}{}",
            page.hostname.trim(),
            path.trim_end_matches('/')
        );
        return Ok(Url::parse(&derived)?);
    }

    Ok(Url::parse(FALLBACK_BASE_URL)?)
}
