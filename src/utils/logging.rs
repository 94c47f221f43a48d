use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EnvConfig;

/// Logging setup.
pub struct LoggingConfig;

impl LoggingConfig {
    /// Initialize the tracing subscriber.
    ///
    /// Configured through the environment:
    /// - `RUST_LOG`: standard filter directives (error, warn, info, debug, trace)
    /// - `HIAGENT_DEBUG`: verbose output with targets, files, and line numbers
    pub fn init() {
        let is_debug = Self::is_debug();

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => {
                if is_debug {
                    EnvFilter::new("hiagent=debug,info")
                } else {
                    EnvFilter::new("hiagent=info,warn")
                }
            }
        };

        let fmt_layer = if is_debug {
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
        } else {
            fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();

        if is_debug {
            tracing::debug!("debug mode enabled");
        }
    }

    /// Initialize with an explicit filter string.
    pub fn init_with_filter(filter: &str) {
        let env_filter = EnvFilter::new(filter);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    pub fn is_debug() -> bool {
        EnvConfig::is_debug_mode()
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn test_is_debug() {
        env::remove_var("HIAGENT_DEBUG");
        assert!(!LoggingConfig::is_debug());

        env::set_var("HIAGENT_DEBUG", "1");
        assert!(LoggingConfig::is_debug());

        env::remove_var("HIAGENT_DEBUG");
    }
}
