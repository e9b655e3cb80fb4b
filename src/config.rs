//! TOML configuration.
//!
//! ```toml
//! [model]
//! url = "http://localhost:11434"
//! name = "qwen2.5-coder:7b"
//! timeout_secs = 30
//!
//! [server]
//! bind = "0.0.0.0:8000"
//!
//! [storage]
//! ontologies_dir = "./storage/ontologies"
//! default_ontology = "example_ontology.json"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section is optional. The `MODEL_URL` environment variable overrides
//! `model.url`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const MODEL_URL_ENV: &str = "MODEL_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_url")]
    pub url: String,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Replaces the built-in system prompt when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: default_model_url(),
            name: default_model_name(),
            timeout_secs: default_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_model_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model_name() -> String {
    "qwen2.5-coder:7b".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory scanned by `GET /ontologies` and used by load-from-storage.
    #[serde(default = "default_ontologies_dir")]
    pub ontologies_dir: PathBuf,
    /// Where uploaded ontology files are written before loading.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// File name inside `ontologies_dir` loaded when the server starts.
    #[serde(default)]
    pub default_ontology: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ontologies_dir: default_ontologies_dir(),
            upload_dir: default_upload_dir(),
            default_ontology: None,
        }
    }
}

fn default_ontologies_dir() -> PathBuf {
    PathBuf::from("./storage/ontologies")
}
fn default_upload_dir() -> PathBuf {
    std::env::temp_dir()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Applies the `MODEL_URL` override; blank values are ignored.
    fn override_model_url(&mut self, url: Option<String>) {
        if let Some(url) = url {
            if !url.trim().is_empty() {
                self.model.url = url;
            }
        }
    }
}

/// Parses and validates configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config = parse_toml(content)?;
    validate(&config)?;
    Ok(config)
}

fn parse_toml(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

/// Reads the config file at `path`, applies environment overrides, then validates.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    finish(parse_toml(&content)?, std::env::var(MODEL_URL_ENV).ok())
}

/// Loads `path` when it exists, otherwise falls back to defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    tracing::debug!(path = %path.display(), "config file not found, using defaults");
    finish(Config::default(), std::env::var(MODEL_URL_ENV).ok())
}

/// Overrides are validated like file values.
fn finish(mut config: Config, model_url: Option<String>) -> Result<Config> {
    config.override_model_url(model_url);
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.model.url.trim().is_empty() {
        anyhow::bail!("model.url must not be empty");
    }
    if !config.model.url.starts_with("http://") && !config.model.url.starts_with("https://") {
        anyhow::bail!(
            "model.url must start with http:// or https://, got '{}'",
            config.model.url
        );
    }
    if config.model.name.trim().is_empty() {
        anyhow::bail!("model.name must not be empty");
    }
    if config.model.timeout_secs == 0 {
        anyhow::bail!("model.timeout_secs must be > 0");
    }
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.model.url, "http://localhost:11434");
        assert_eq!(config.model.name, "qwen2.5-coder:7b");
        assert_eq!(config.model.timeout_secs, 30);
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(
            config.storage.ontologies_dir,
            PathBuf::from("./storage/ontologies")
        );
        assert!(config.storage.default_ontology.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
[model]
url = "http://gpu-box:11434"
name = "llama3.2"
timeout_secs = 90
system_prompt = "Answer briefly."

[server]
bind = "127.0.0.1:9000"

[storage]
ontologies_dir = "/srv/ontologies"
upload_dir = "/srv/uploads"
default_ontology = "core.json"

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.model.url, "http://gpu-box:11434");
        assert_eq!(config.model.timeout_secs, 90);
        assert_eq!(config.model.system_prompt.as_deref(), Some("Answer briefly."));
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.storage.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.storage.default_ontology.as_deref(), Some("core.json"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = parse_config("[model]\ntimeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_rejects_non_http_model_url() {
        let err = parse_config("[model]\nurl = \"localhost:11434\"\n").unwrap_err();
        assert!(err.to_string().contains("model.url"));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(parse_config("[model\nurl = 1").is_err());
    }

    #[test]
    fn test_model_url_override_is_validated() {
        let err = finish(Config::default(), Some("localhost:11434".to_string())).unwrap_err();
        assert!(err.to_string().contains("model.url"));

        let config = parse_toml("[model]\nurl = \"http://file-host:11434\"\n").unwrap();
        let config = finish(config, Some("https://env-host:11434".to_string())).unwrap();
        assert_eq!(config.model.url, "https://env-host:11434");
    }

    #[test]
    fn test_blank_model_url_override_is_ignored() {
        let config = finish(Config::default(), Some("  ".to_string())).unwrap();
        assert_eq!(config.model.url, "http://localhost:11434");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = load_config_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }
}
