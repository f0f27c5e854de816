//! Configuration loading from capbroker.toml.

use std::path::Path;

use broker::Timeouts;
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "capbroker.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bounds for external calls.
    pub timeouts: Timeouts,

    pub log: LogConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Create a default configuration.
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Load `explicit` if given, else `capbroker.toml` if it exists, else
    /// defaults.
    ///
    /// An explicitly named file must exist.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default_config()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.timeouts, Timeouts::default());
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn partial_sections() {
        let config = Config::parse(
            r#"
[timeouts]
invoke_secs = 10

[log]
filter = "broker=debug"
"#,
        )
        .unwrap();
        assert_eq!(config.timeouts.invoke_secs, 10);
        assert_eq!(config.timeouts.version_probe_secs, 2);
        assert_eq!(config.log.filter, "broker=debug");
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = Config::parse("[timeouts]\ninvoke_secs = \"five\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\nrepository_probe_secs = 4").unwrap();

        let config = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(config.timeouts.repository_probe_secs, 4);
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::resolve(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
