use crate::matching::MatchConfig;
use crate::transfer::TransferOptions;
use crate::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable overriding [`MatchConfig::acceptance_threshold`].
pub const ENV_MATCH_THRESHOLD: &str = "BEATBRIDGE_MATCH_THRESHOLD";
/// Environment variable overriding [`MatchConfig::request_delay_ms`].
pub const ENV_REQUEST_DELAY_MS: &str = "BEATBRIDGE_REQUEST_DELAY_MS";
/// Environment variable overriding [`MatchConfig::max_concurrent_searches`].
pub const ENV_MAX_CONCURRENCY: &str = "BEATBRIDGE_MAX_CONCURRENCY";
/// Environment variable overriding [`TransferOptions::timeout_ms`], in seconds.
pub const ENV_TIMEOUT_SECS: &str = "BEATBRIDGE_TIMEOUT_SECS";

/// Settings for matching and transfers.
///
/// Stored as JSON in the XDG config directory:
/// `~/.config/beatbridge/config.json`. Every field is optional in the file;
/// missing ones take their defaults.
///
/// # Examples
///
/// ```rust
/// use beatbridge::BridgeConfig;
///
/// let config = BridgeConfig::from_json(r#"{"matching": {"acceptance_threshold": 0.85}}"#).unwrap();
/// assert_eq!(config.matching.acceptance_threshold, 0.85);
/// assert_eq!(config.matching.request_delay_ms, 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub matching: MatchConfig,
    pub transfer: TransferOptions,
}

impl BridgeConfig {
    /// Get the default config file path using XDG directories.
    ///
    /// Returns a path like: `~/.config/beatbridge/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            BridgeError::Config("Cannot determine XDG config directory".to_string())
        })?;
        Ok(config_dir.join("beatbridge").join("config.json"))
    }

    /// Parse and validate a config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BridgeConfig = serde_json::from_str(json)
            .map_err(|e| BridgeError::Config(format!("Failed to parse config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("Config loaded from: {}", path.display());
        Ok(config)
    }

    /// Load the default config file if it exists, otherwise use defaults.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from `path` when given, else the default location, then apply
    /// `BEATBRIDGE_*` environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::load_default()?,
        };
        config.with_env_overrides()
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(threshold) = parse_override::<f64>(&lookup, ENV_MATCH_THRESHOLD)? {
            self.matching.acceptance_threshold = threshold;
        }
        if let Some(delay) = parse_override::<u64>(&lookup, ENV_REQUEST_DELAY_MS)? {
            self.matching.request_delay_ms = delay;
        }
        if let Some(max) = parse_override::<usize>(&lookup, ENV_MAX_CONCURRENCY)? {
            self.matching.max_concurrent_searches = max;
        }
        if let Some(timeout) = parse_override::<u64>(&lookup, ENV_TIMEOUT_SECS)? {
            self.transfer.timeout_ms = Some(timeout.saturating_mul(1000));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.matching.validate()?;
        if self.transfer.timeout_ms == Some(0) {
            return Err(BridgeError::Config(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::debug!("Config saved to: {}", path.display());
        Ok(())
    }
}

fn parse_override<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| BridgeError::Config(format!("{key}={raw:?} is invalid: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.matching.acceptance_threshold, 0.8);
        assert_eq!(config.matching.request_delay_ms, 100);
        assert_eq!(config.matching.max_concurrent_searches, 1);
        assert!(!config.matching.verify_matches);
        assert!(!config.transfer.deduplicate);
        assert!(config.transfer.timeout_ms.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = BridgeConfig::from_json(
            r#"{"matching": {"retry": {"max_retries": 1}}, "transfer": {"deduplicate": true}}"#,
        )
        .unwrap();
        assert_eq!(config.matching.retry.max_retries, 1);
        assert_eq!(config.matching.retry.base_delay, 5);
        assert!(config.transfer.deduplicate);
    }

    #[test]
    fn test_env_overrides() {
        let config = BridgeConfig::default()
            .with_overrides(env(&[
                (ENV_MATCH_THRESHOLD, "0.9"),
                (ENV_REQUEST_DELAY_MS, "250"),
                (ENV_MAX_CONCURRENCY, "4"),
                (ENV_TIMEOUT_SECS, "60"),
            ]))
            .unwrap();

        assert_eq!(config.matching.acceptance_threshold, 0.9);
        assert_eq!(config.matching.request_delay_ms, 250);
        assert_eq!(config.matching.max_concurrent_searches, 4);
        assert_eq!(config.transfer.timeout_ms, Some(60_000));
    }

    #[test]
    fn test_invalid_overrides_are_config_errors() {
        let err = BridgeConfig::default()
            .with_overrides(env(&[(ENV_REQUEST_DELAY_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));

        let err = BridgeConfig::default()
            .with_overrides(env(&[(ENV_MATCH_THRESHOLD, "1.2")]))
            .unwrap_err();
        assert!(err.to_string().contains("acceptance_threshold"));

        let err = BridgeConfig::default()
            .with_overrides(env(&[(ENV_MAX_CONCURRENCY, "0")]))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = BridgeConfig::default();
        config.matching.verify_matches = true;
        config.transfer.playlist_name = Some("Copied".to_string());
        config.save(&path).unwrap();

        let loaded = BridgeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
