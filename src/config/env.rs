use std::env;

use crate::error::{HiAgentError, Result};

/// Environment variable resolution for client configuration.
pub struct EnvConfig;

impl EnvConfig {
    /// Resolve an API key that may be a literal value, a `${VAR_NAME}`
    /// placeholder, or empty (falls back to `default_env_var`).
    pub fn get_api_key(api_key: &str, default_env_var: &str) -> Result<String> {
        if api_key.starts_with("${") && api_key.ends_with('}') {
            let env_var_name = &api_key[2..api_key.len() - 1];
            Self::get_env(env_var_name)
        } else if api_key.is_empty() {
            Self::get_env(default_env_var)
        } else {
            Ok(api_key.to_string())
        }
    }

    pub fn get_env(key: &str) -> Result<String> {
        env::var(key)
            .map_err(|_| HiAgentError::Config(format!("environment variable `{key}` is not set")))
    }

    pub fn is_debug_mode() -> bool {
        env::var("HIAGENT_DEBUG").is_ok()
    }
}
