// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use crate::client::SystemAuth;
use crate::statestore::RESULT_BUFFER_INDEX_NAME;

/// Default system principal store calls run under.
pub const DEFAULT_SYSTEM_PRINCIPAL: &str = "asyncquery_state";

/// asyncquery-state configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Default results index remote jobs write output to
    pub result_index: String,
    /// System principal store calls run under
    pub system_principal: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `ASYNCQUERY_STATE_RESULT_INDEX`: default results index
    ///   (default: `.query_execution_result`)
    /// - `ASYNCQUERY_STATE_SYSTEM_PRINCIPAL`: system principal
    ///   (default: `asyncquery_state`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let result_index = std::env::var("ASYNCQUERY_STATE_RESULT_INDEX")
            .unwrap_or_else(|_| RESULT_BUFFER_INDEX_NAME.to_string());
        if result_index.is_empty() {
            return Err(ConfigError::Invalid(
                "ASYNCQUERY_STATE_RESULT_INDEX",
                "must not be empty",
            ));
        }

        let system_principal = std::env::var("ASYNCQUERY_STATE_SYSTEM_PRINCIPAL")
            .unwrap_or_else(|_| DEFAULT_SYSTEM_PRINCIPAL.to_string());
        if system_principal.is_empty() {
            return Err(ConfigError::Invalid(
                "ASYNCQUERY_STATE_SYSTEM_PRINCIPAL",
                "must not be empty",
            ));
        }

        Ok(Self {
            result_index,
            system_principal,
        })
    }

    /// The system credential document clients should be constructed with.
    pub fn system_auth(&self) -> SystemAuth {
        SystemAuth::new(self.system_principal.clone())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set env vars for a test and restore them after
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.remove("ASYNCQUERY_STATE_RESULT_INDEX");
        guard.remove("ASYNCQUERY_STATE_SYSTEM_PRINCIPAL");

        let config = Config::from_env().unwrap();

        assert_eq!(config.result_index, ".query_execution_result");
        assert_eq!(config.system_principal, "asyncquery_state");
        assert_eq!(config.system_auth().principal(), "asyncquery_state");
    }

    #[test]
    fn test_config_custom_result_index() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("ASYNCQUERY_STATE_RESULT_INDEX", "my_result_index");
        guard.remove("ASYNCQUERY_STATE_SYSTEM_PRINCIPAL");

        let config = Config::from_env().unwrap();
        assert_eq!(config.result_index, "my_result_index");
    }

    #[test]
    fn test_config_empty_result_index_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("ASYNCQUERY_STATE_RESULT_INDEX", "");

        let result = Config::from_env();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid("ASYNCQUERY_STATE_RESULT_INDEX", _)
        ));
    }

    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::Missing("MY_VAR");
        assert_eq!(
            missing.to_string(),
            "missing required environment variable: MY_VAR"
        );

        let invalid = ConfigError::Invalid("MY_VAR", "must not be empty");
        assert_eq!(
            invalid.to_string(),
            "invalid value for MY_VAR: must not be empty"
        );
    }
}
