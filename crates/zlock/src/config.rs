//! Client configuration.
//!
//! Loaded in layers, lowest to highest precedence:
//! 1. Hardcoded defaults
//! 2. A TOML file (explicit path, or the file named by `ZLOCK_CONFIG`)
//! 3. Environment variables
//!
//! ```toml
//! sibling_order = "sequence"
//! default_initial_retry_wait_ms = 100
//! forced_release_channel_capacity = 64
//! ```

use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use tracing::info;

use crate::constants::CONFIG_FILE_ENV;
use crate::constants::DEFAULT_FORCED_RELEASE_CAPACITY;
use crate::constants::DEFAULT_INITIAL_RETRY_WAIT_MS;
use crate::constants::MAX_FORCED_RELEASE_CAPACITY;
use crate::error::ConfigError;
use crate::error::ParseFileSnafu;
use crate::error::ReadFileSnafu;
use crate::types::SiblingOrder;

/// Environment override for [`LockClientConfig::sibling_order`].
pub const ENV_SIBLING_ORDER: &str = "ZLOCK_SIBLING_ORDER";
/// Environment override for [`LockClientConfig::default_initial_retry_wait_ms`].
pub const ENV_DEFAULT_RETRY_WAIT_MS: &str = "ZLOCK_DEFAULT_RETRY_WAIT_MS";
/// Environment override for [`LockClientConfig::forced_release_channel_capacity`].
pub const ENV_FORCED_RELEASE_CAPACITY: &str = "ZLOCK_FORCED_RELEASE_CAPACITY";

/// Settings shared by every lock taken through one [`LockClient`](crate::LockClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockClientConfig {
    /// How siblings are ranked.
    pub sibling_order: SiblingOrder,
    /// Backoff base given to requests built by [`LockClient::request`](crate::LockClient::request).
    pub default_initial_retry_wait_ms: u64,
    /// Buffer size of the forced-release notification channel.
    pub forced_release_channel_capacity: usize,
}

impl Default for LockClientConfig {
    fn default() -> Self {
        Self {
            sibling_order: SiblingOrder::default(),
            default_initial_retry_wait_ms: DEFAULT_INITIAL_RETRY_WAIT_MS,
            forced_release_channel_capacity: DEFAULT_FORCED_RELEASE_CAPACITY,
        }
    }
}

impl LockClientConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        toml::from_str(&contents).context(ParseFileSnafu { path })
    }

    /// Load configuration with layered precedence and validate it.
    ///
    /// `file` wins over `ZLOCK_CONFIG`; environment variables override
    /// whatever the file set.
    pub fn load_with_layers(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));

        let mut config = match file {
            Some(path) => {
                info!(path = %path.display(), "loading lock client configuration");
                Self::from_toml_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ZLOCK_*` environment variables on top of the current values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_SIBLING_ORDER) {
            self.sibling_order = parse_value(ENV_SIBLING_ORDER, &value)?;
        }
        if let Some(value) = lookup(ENV_DEFAULT_RETRY_WAIT_MS) {
            self.default_initial_retry_wait_ms = parse_value(ENV_DEFAULT_RETRY_WAIT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_FORCED_RELEASE_CAPACITY) {
            self.forced_release_channel_capacity = parse_value(ENV_FORCED_RELEASE_CAPACITY, &value)?;
        }
        Ok(())
    }

    /// Reject values the client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_initial_retry_wait_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "default_initial_retry_wait_ms".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        let capacity = self.forced_release_channel_capacity;
        if capacity == 0 || capacity > MAX_FORCED_RELEASE_CAPACITY {
            return Err(ConfigError::InvalidValue {
                key: "forced_release_channel_capacity".to_string(),
                value: capacity.to_string(),
                reason: format!("must be between 1 and {MAX_FORCED_RELEASE_CAPACITY}"),
            });
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = LockClientConfig::default();
        assert_eq!(config.sibling_order, SiblingOrder::Sequence);
        assert_eq!(config.default_initial_retry_wait_ms, DEFAULT_INITIAL_RETRY_WAIT_MS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: LockClientConfig = toml::from_str("sibling_order = \"lexicographic\"").unwrap();
        assert_eq!(config.sibling_order, SiblingOrder::Lexicographic);
        assert_eq!(config.forced_release_channel_capacity, DEFAULT_FORCED_RELEASE_CAPACITY);
    }

    #[test]
    fn test_from_toml_file() {
        let path = std::env::temp_dir().join(format!("zlock-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "default_initial_retry_wait_ms = 250").unwrap();
        writeln!(file, "forced_release_channel_capacity = 8").unwrap();
        drop(file);

        let config = LockClientConfig::load_with_layers(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.default_initial_retry_wait_ms, 250);
        assert_eq!(config.forced_release_channel_capacity, 8);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = LockClientConfig::from_toml_file("/nonexistent/zlock.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = LockClientConfig::default();
        config
            .apply_overrides_from(lookup_from(&[
                (ENV_SIBLING_ORDER, "lexicographic"),
                (ENV_DEFAULT_RETRY_WAIT_MS, "20"),
                (ENV_FORCED_RELEASE_CAPACITY, "4"),
            ]))
            .unwrap();
        assert_eq!(config.sibling_order, SiblingOrder::Lexicographic);
        assert_eq!(config.default_initial_retry_wait_ms, 20);
        assert_eq!(config.forced_release_channel_capacity, 4);
    }

    #[test]
    fn test_unparseable_override() {
        let mut config = LockClientConfig::default();
        let err = config.apply_overrides_from(lookup_from(&[(ENV_DEFAULT_RETRY_WAIT_MS, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_DEFAULT_RETRY_WAIT_MS));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = LockClientConfig {
            forced_release_channel_capacity: 0,
            ..LockClientConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LockClientConfig {
            default_initial_retry_wait_ms: 0,
            ..LockClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
