use std::time::Duration;

use crate::config::EnvConfig;
use crate::error::Result;

pub const DEFAULT_USER_AGENT: &str = concat!("hiagent/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_USER_ID: &str = "hiagent_user";

const API_KEY_ENV_VAR: &str = "HIAGENT_APIKEY";
const BASE_URL_ENV_VAR: &str = "HIAGENT_BASE_URL";

/// Connection settings for [`HiAgentClient`](crate::HiAgentClient).
///
/// Pool sizing and timeouts are explicit here rather than left to the HTTP
/// library's defaults. The blocking chat call deliberately carries no
/// timeout: generation can outlast any fixed budget.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Timeout for single-shot metadata calls (create conversation, message
    /// history, workflow runs).
    pub metadata_timeout: Duration,
    /// Timeout covering the whole streaming chat call.
    pub stream_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            metadata_timeout: Duration::from_secs(10),
            stream_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }

    /// Read `HIAGENT_BASE_URL` and `HIAGENT_APIKEY` from the environment.
    pub fn from_env() -> Result<Self> {
        let base_url = EnvConfig::get_env(BASE_URL_ENV_VAR)?;
        let api_key = EnvConfig::get_env(API_KEY_ENV_VAR)?;
        Ok(Self::new(base_url, api_key))
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn with_pool_max_idle_per_host(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Resolve the configured key, honoring `${VAR}` placeholders and the
    /// `HIAGENT_APIKEY` fallback for an empty value.
    pub fn resolve_api_key(&self) -> Result<String> {
        EnvConfig::get_api_key(&self.api_key, API_KEY_ENV_VAR)
    }
}
