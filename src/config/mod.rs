//! Configuration management.
//!
//! hrflow configuration can come from:
//! - Config file (~/.config/hrflow/config.toml)
//! - Environment variables (HRFLOW_*)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// hrflow configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Execution engine the dispatch client talks to
    #[serde(default)]
    pub engine: EngineConfig,

    /// Directory service for departments, locations and roles
    #[serde(default)]
    pub directory: DirectoryConfig,
}

/// Execution engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trigger endpoint URL
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,

    /// Bearer token sent with every dispatch
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-call timeout (seconds)
    #[serde(default = "default_engine_timeout")]
    pub timeout_seconds: u64,

    /// Connect timeout (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_engine_endpoint(),
            api_key: None,
            timeout_seconds: default_engine_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl EngineConfig {
    /// Reject timeouts of zero, which would fail every call immediately.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(Error::Config(
                "engine.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_seconds == 0 {
            return Err(Error::Config(
                "engine.connect_timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_engine_endpoint() -> String {
    "http://localhost:54321/functions/v1/workflows/trigger".to_string()
}

fn default_engine_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

/// Directory service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL; `/departments`, `/locations` and `/roles` are appended
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,
}

impl Config {
    /// Load configuration from the default location plus env overrides.
    ///
    /// A missing or unreadable default file is not an error.
    pub fn load() -> Self {
        let mut config = Self::default();

        let path = Self::config_dir().join("config.toml");
        match Self::load_partial_from_path(&path) {
            Ok(Some(partial)) => config.apply_partial(partial),
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring config file {}: {}", path.display(), e),
        }

        config.apply_env_overrides();
        if let Err(e) = config.engine.validate() {
            tracing::warn!("{}; using default engine timeouts", e);
            config.engine.timeout_seconds = default_engine_timeout();
            config.engine.connect_timeout_seconds = default_connect_timeout();
        }
        config
    }

    /// Load configuration from an explicit file plus env overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let partial = Self::load_partial_from_path(path)?.ok_or_else(|| {
            Error::Config(format!("Config file not found: {}", path.display()))
        })?;

        let mut config = Self::default();
        config.apply_partial(partial);
        config.apply_env_overrides();
        config.engine.validate()?;
        Ok(config)
    }

    /// Get the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("hrflow"))
            .unwrap_or_else(|| PathBuf::from(".hrflow"))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("HRFLOW_ENGINE_URL") {
            self.engine.endpoint = url;
        }
        if let Some(key) = var("HRFLOW_API_KEY") {
            self.engine.api_key = Some(key);
        }
        if let Some(timeout) = var("HRFLOW_ENGINE_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(parsed) if parsed > 0 => self.engine.timeout_seconds = parsed,
                _ => tracing::warn!(
                    "Ignoring HRFLOW_ENGINE_TIMEOUT_SECONDS={}: not a positive number",
                    timeout
                ),
            }
        }
        if let Some(url) = var("HRFLOW_DIRECTORY_URL") {
            self.directory.base_url = Some(url);
        }
    }

    fn load_partial_from_path(path: &Path) -> Result<Option<PartialConfig>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(engine) = partial.engine {
            self.engine = engine;
        }
        if let Some(directory) = partial.directory {
            self.directory = directory;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    engine: Option<EngineConfig>,
    directory: Option<DirectoryConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.engine.endpoint.ends_with("/workflows/trigger"));
        assert_eq!(config.engine.timeout_seconds, 10);
        assert_eq!(config.engine.connect_timeout_seconds, 5);
        assert!(config.engine.api_key.is_none());
        assert!(config.directory.base_url.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
[directory]
base_url = "https://hr.example.com/api"
"#,
        );
        let partial = Config::load_partial_from_path(file.path()).unwrap().unwrap();
        let mut config = Config::default();
        config.apply_partial(partial);

        assert_eq!(
            config.directory.base_url.as_deref(),
            Some("https://hr.example.com/api")
        );
        assert_eq!(config.engine.timeout_seconds, 10);
    }

    #[test]
    fn test_engine_section_fills_missing_keys() {
        let file = write_config(
            r#"
[engine]
endpoint = "https://engine.example.com/trigger"
api_key = "secret"
"#,
        );
        let partial = Config::load_partial_from_path(file.path()).unwrap().unwrap();
        let mut config = Config::default();
        config.apply_partial(partial);

        assert_eq!(config.engine.endpoint, "https://engine.example.com/trigger");
        assert_eq!(config.engine.api_key.as_deref(), Some("secret"));
        assert_eq!(config.engine.connect_timeout_seconds, 5);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let file = write_config("[engine\nendpoint = ");
        let err = Config::load_from_path(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Config::load_partial_from_path(&path).unwrap().is_none());
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("HRFLOW_ENGINE_URL", "http://127.0.0.1:9000/trigger"),
            ("HRFLOW_API_KEY", "token"),
            ("HRFLOW_ENGINE_TIMEOUT_SECONDS", "3"),
            ("HRFLOW_DIRECTORY_URL", "http://127.0.0.1:9001"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.engine.endpoint, "http://127.0.0.1:9000/trigger");
        assert_eq!(config.engine.api_key.as_deref(), Some("token"));
        assert_eq!(config.engine.timeout_seconds, 3);
        assert_eq!(
            config.directory.base_url.as_deref(),
            Some("http://127.0.0.1:9001")
        );
    }

    #[test]
    fn test_bad_timeout_override_ignored() {
        for value in ["soon", "0"] {
            let mut config = Config::default();
            config.apply_overrides(|k| {
                (k == "HRFLOW_ENGINE_TIMEOUT_SECONDS").then(|| value.to_string())
            });
            assert_eq!(config.engine.timeout_seconds, 10);
        }
    }

    #[test]
    fn test_zero_timeout_in_file_rejected() {
        let file = write_config(
            r#"
[engine]
timeout_seconds = 0
"#,
        );
        let err = Config::load_from_path(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn test_zero_connect_timeout_rejected() {
        let engine = EngineConfig {
            connect_timeout_seconds: 0,
            ..EngineConfig::default()
        };
        assert!(engine.validate().is_err());
        assert!(EngineConfig::default().validate().is_ok());
    }
}
