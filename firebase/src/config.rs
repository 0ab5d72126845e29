//! Connection settings for the Realtime Database REST API.
//!
//! Values come from the application (usually via [`FirebaseConfig::from_env`]);
//! nothing here is hardcoded beyond defaults.

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "FIREBASE_DATABASE_URL";
/// Environment variable holding the optional auth token.
pub const AUTH_TOKEN_VAR: &str = "FIREBASE_AUTH_TOKEN";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_SECS_VAR: &str = "FIREBASE_TIMEOUT_SECS";

/// Errors raised while reading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// The offending value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Realtime Database connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    /// Database root, e.g. `https://my-app-default-rtdb.firebaseio.com`.
    ///
    /// Stored without a trailing slash.
    pub database_url: String,

    /// Database secret or ID token appended as `?auth=`.
    ///
    /// Default: none (rules must allow unauthenticated access)
    pub auth_token: Option<String>,

    /// Per-request timeout applied by the HTTP client.
    ///
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl FirebaseConfig {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create configuration for the database at `database_url`.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        let mut database_url = database_url.into();
        while database_url.ends_with('/') {
            database_url.pop();
        }
        Self {
            database_url,
            auth_token: None,
            request_timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the auth token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `FIREBASE_DATABASE_URL` is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Same as [`FirebaseConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(DATABASE_URL_VAR)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL_VAR))?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: DATABASE_URL_VAR,
                value: url,
                reason: "expected an http(s) URL".to_string(),
            });
        }

        let mut config = Self::new(url);

        if let Some(token) = lookup(AUTH_TOKEN_VAR).filter(|t| !t.is_empty()) {
            config = config.with_auth_token(token);
        }

        if let Some(raw) = lookup(TIMEOUT_SECS_VAR) {
            let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: TIMEOUT_SECS_VAR,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
