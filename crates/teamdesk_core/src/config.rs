//! Application configuration.
//!
//! # Responsibility
//! - Load the TOML configuration file into typed sections.
//! - Validate generation settings before any client is built.
//!
//! # Invariants
//! - Every field has a default; an empty file is a valid configuration.
//! - API keys never live in the file, only the name of the variable holding one.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "TEAMDESK_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.2
}

fn default_db_path() -> PathBuf {
    PathBuf::from("teamdesk.sqlite3")
}

fn default_level() -> String {
    default_log_level().to_string()
}

/// Configuration load/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config file not found: {}", path.display()),
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse {
                path: Some(path),
                source,
            } => write!(f, "failed to parse config `{}`: {source}", path.display()),
            Self::Parse { path: None, source } => write!(f, "failed to parse config: {source}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Settings for the OpenAI-compatible generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable that holds the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl GenerationConfig {
    /// Checks values that would otherwise fail at request time.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("generation.model cannot be empty".into()));
        }
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "generation.base_url must start with http:// or https://, got `{base_url}`"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_secs must be greater than zero".into(),
            ));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "generation.temperature must be within 0..=2, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Reads the API key from the configured environment variable.
    ///
    /// Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Chat completions endpoint derived from `base_url`.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim().trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Absolute log directory. File logging is off when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// - `ConfigError::NotFound` when `path` does not exist.
    /// - `ConfigError::Read` / `ConfigError::Parse` with the offending path.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: None, source })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, GenerationConfig};

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.timeout_secs, 60);
        assert!(config.logging.dir.is_none());
        config.generation.validate().unwrap();
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [generation]
            model = "local-model"
            base_url = "http://localhost:8080/v1/"

            [storage]
            db_path = "/tmp/td.sqlite3"
            "#,
        )
        .unwrap();
        assert_eq!(config.generation.model, "local-model");
        assert_eq!(config.generation.api_key_env, "TEAMDESK_API_KEY");
        assert_eq!(
            config.generation.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(config.storage.db_path.to_str(), Some("/tmp/td.sqlite3"));
    }

    #[test]
    fn validate_rejects_bad_generation_values() {
        let cases = [
            GenerationConfig {
                model: " ".into(),
                ..GenerationConfig::default()
            },
            GenerationConfig {
                base_url: "ftp://example.com".into(),
                ..GenerationConfig::default()
            },
            GenerationConfig {
                timeout_secs: 0,
                ..GenerationConfig::default()
            },
            GenerationConfig {
                temperature: 3.5,
                ..GenerationConfig::default()
            },
        ];
        for case in cases {
            assert!(matches!(case.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[generation\nmodel=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = AppConfig::load(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(path) if path == missing));
    }
}
