//! Todo store configuration.

use std::time::Duration;
use synced_todo_firebase::ConfigError;
use synced_todo_runtime::retry::RetryPolicy;

/// Environment variable naming the remote collection.
pub const COLLECTION_VAR: &str = "TODO_COLLECTION";
/// Environment variable holding the operation timeout in milliseconds.
pub const OPERATION_TIMEOUT_MS_VAR: &str = "TODO_OPERATION_TIMEOUT_MS";
/// Environment variable holding the number of retries for transient failures.
pub const MAX_RETRIES_VAR: &str = "TODO_MAX_RETRIES";

/// Configuration shared by every domain operation.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoConfig {
    /// Remote collection holding the items.
    ///
    /// Default: `todos`
    pub collection: String,

    /// Upper bound for one operation, retries included.
    ///
    /// Default: 15 seconds
    pub operation_timeout: Duration,

    /// Retry policy for transient remote failures.
    ///
    /// Default: no retries
    pub retry_policy: RetryPolicy,
}

impl TodoConfig {
    /// Default collection name.
    pub const DEFAULT_COLLECTION: &'static str = "todos";
    /// Default operation timeout.
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(15);

    /// Set the collection name.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the operation timeout.
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Read configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Same as [`TodoConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(collection) = lookup(COLLECTION_VAR) {
            let collection = collection.trim().to_string();
            synced_todo_core::remote::validate_key(&collection).map_err(|e| {
                ConfigError::Invalid {
                    var: COLLECTION_VAR,
                    value: collection.clone(),
                    reason: e.to_string(),
                }
            })?;
            config = config.with_collection(collection);
        }

        if let Some(millis) = parse_u64(&lookup, OPERATION_TIMEOUT_MS_VAR)? {
            if millis == 0 {
                return Err(ConfigError::Invalid {
                    var: OPERATION_TIMEOUT_MS_VAR,
                    value: millis.to_string(),
                    reason: "timeout must be positive".to_string(),
                });
            }
            config = config.with_operation_timeout(Duration::from_millis(millis));
        }

        if let Some(retries) = parse_u64(&lookup, MAX_RETRIES_VAR)? {
            let retries = usize::try_from(retries).map_err(|e| ConfigError::Invalid {
                var: MAX_RETRIES_VAR,
                value: retries.to_string(),
                reason: e.to_string(),
            })?;
            let policy = if retries == 0 {
                RetryPolicy::none()
            } else {
                RetryPolicy::builder().max_retries(retries).build()
            };
            config = config.with_retry_policy(policy);
        }

        Ok(config)
    }
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            collection: Self::DEFAULT_COLLECTION.to_string(),
            operation_timeout: Self::DEFAULT_OPERATION_TIMEOUT,
            retry_policy: RetryPolicy::none(),
        }
    }
}

fn parse_u64<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |var| {
            pairs
                .iter()
                .find(|(k, _)| *k == var)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let config = TodoConfig::default();
        assert_eq!(config.collection, "todos");
        assert_eq!(config.operation_timeout, Duration::from_secs(15));
        assert_eq!(config.retry_policy.max_retries, 0);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(TodoConfig::from_lookup(|_| None).unwrap(), TodoConfig::default());
    }

    #[test]
    fn test_reads_all_values() {
        let config = TodoConfig::from_lookup(lookup_from(&[
            (COLLECTION_VAR, "groceries"),
            (OPERATION_TIMEOUT_MS_VAR, "2500"),
            (MAX_RETRIES_VAR, "4"),
        ]))
        .unwrap();

        assert_eq!(config.collection, "groceries");
        assert_eq!(config.operation_timeout, Duration::from_millis(2500));
        assert_eq!(config.retry_policy.max_retries, 4);
    }

    #[test]
    fn test_rejects_unaddressable_collection() {
        let result = TodoConfig::from_lookup(lookup_from(&[(COLLECTION_VAR, "to/dos")]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: COLLECTION_VAR, .. })));
    }

    #[test]
    fn test_rejects_garbage_numbers() {
        let result = TodoConfig::from_lookup(lookup_from(&[(MAX_RETRIES_VAR, "lots")]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: MAX_RETRIES_VAR, .. })));

        let result = TodoConfig::from_lookup(lookup_from(&[(OPERATION_TIMEOUT_MS_VAR, "0")]));
        assert!(result.is_err());
    }
}
