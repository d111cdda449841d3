//! Application configuration
//!
//! Configuration is layered: built-in defaults, then an optional file
//! (JSON, YAML or TOML, chosen by extension), then `CARDIO_*` environment
//! variables. Command-line flags are applied last by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::artifacts::ArtifactRef;
use crate::error::{Result, RiskError};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CARDIO_";

/// Where the model and scaler come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Hub repository holding the exported artifacts
    pub repo_id: String,
    /// Branch, tag or commit of the repository
    pub revision: String,
    /// Base URL of the artifact hub
    pub hub_url: String,
    /// Classifier file name
    pub model_file: String,
    /// Scaler file name
    pub scaler_file: String,
    /// Expected SHA-256 of the classifier file (hex)
    pub model_sha256: Option<String>,
    /// Expected SHA-256 of the scaler file (hex)
    pub scaler_sha256: Option<String>,
    /// Local directory searched before the hub
    pub local_dir: Option<PathBuf>,
    /// Download cache
    pub cache_dir: PathBuf,
    /// Per-request timeout for downloads
    pub timeout_ms: u64,
    /// Download retries after the first attempt
    pub max_retries: u32,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            repo_id: "barisetiawan51/stacking-model-100".to_string(),
            revision: "main".to_string(),
            hub_url: "https://huggingface.co".to_string(),
            model_file: "stacking_model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            model_sha256: None,
            scaler_sha256: None,
            local_dir: None,
            cache_dir: default_cache_dir(),
            timeout_ms: 30_000,
            max_retries: 3,
        }
    }
}

impl ArtifactConfig {
    pub fn model_ref(&self) -> ArtifactRef {
        ArtifactRef::new(&self.model_file).with_sha256(self.model_sha256.clone())
    }

    pub fn scaler_ref(&self) -> ArtifactRef {
        ArtifactRef::new(&self.scaler_file).with_sha256(self.scaler_sha256.clone())
    }
}

fn default_cache_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"));
    base.join("cardio-risk")
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_size: 64 * 1024,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected text or json", other)),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub artifacts: ArtifactConfig,
    pub server: ServerConfig,
    /// Show contributing factors next to the verdict
    pub explanations_enabled: bool,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactConfig::default(),
            server: ServerConfig::default(),
            explanations_enabled: true,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load configuration from a file, choosing the format by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RiskError::File(format!("{}: {}", path.display(), e)))?;
        Self::parse(path, &content)
    }

    /// Parse configuration text; `path` only selects the format
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "json" => serde_json::from_str(content)
                .map_err(|e| RiskError::Config(format!("Invalid JSON: {}", e))),
            "yaml" | "yml" => serde_yaml::from_str(content)
                .map_err(|e| RiskError::Config(format!("Invalid YAML: {}", e))),
            "toml" => toml::from_str(content)
                .map_err(|e| RiskError::Config(format!("Invalid TOML: {}", e))),
            _ => Err(RiskError::Config(format!(
                "Unsupported file format: {}. Supported formats: json, yaml, yml, toml",
                extension
            ))),
        }
    }

    /// Load defaults or the given file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CARDIO_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Apply overrides from a lookup keyed by the variable name without prefix
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let a = &mut self.artifacts;
        if let Some(v) = lookup("REPO_ID") {
            a.repo_id = v;
        }
        if let Some(v) = lookup("REVISION") {
            a.revision = v;
        }
        if let Some(v) = lookup("HUB_URL") {
            a.hub_url = v;
        }
        if let Some(v) = lookup("MODEL_FILE") {
            a.model_file = v;
        }
        if let Some(v) = lookup("SCALER_FILE") {
            a.scaler_file = v;
        }
        if let Some(v) = lookup("MODEL_SHA256") {
            a.model_sha256 = Some(v);
        }
        if let Some(v) = lookup("SCALER_SHA256") {
            a.scaler_sha256 = Some(v);
        }
        if let Some(v) = lookup("LOCAL_DIR") {
            a.local_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("CACHE_DIR") {
            a.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TIMEOUT_MS") {
            a.timeout_ms = parse_env("TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("MAX_RETRIES") {
            a.max_retries = parse_env("MAX_RETRIES", &v)?;
        }

        let s = &mut self.server;
        if let Some(v) = lookup("HOST") {
            s.host = v;
        }
        if let Some(v) = lookup("PORT") {
            s.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = lookup("MAX_BODY_SIZE") {
            s.max_body_size = parse_env("MAX_BODY_SIZE", &v)?;
        }

        if let Some(v) = lookup("EXPLANATIONS") {
            self.explanations_enabled = parse_env("EXPLANATIONS", &v)?;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.log_format = parse_env("LOG_FORMAT", &v)?;
        }
        Ok(())
    }

    /// Check values that deserialization alone cannot enforce
    pub fn validate(&self) -> Result<()> {
        let a = &self.artifacts;
        if a.model_file.trim().is_empty() || a.scaler_file.trim().is_empty() {
            return Err(RiskError::Config("artifact file names must not be empty".into()));
        }
        if a.local_dir.is_none() {
            if a.repo_id.trim().is_empty() {
                return Err(RiskError::Config("artifacts.repo_id must not be empty".into()));
            }
            if !(a.hub_url.starts_with("http://") || a.hub_url.starts_with("https://")) {
                return Err(RiskError::Config(format!(
                    "artifacts.hub_url must be an http(s) URL, got '{}'",
                    a.hub_url
                )));
            }
        }
        for (key, digest) in [("model_sha256", &a.model_sha256), ("scaler_sha256", &a.scaler_sha256)] {
            if let Some(digest) = digest {
                if digest.len() != 64 || hex::decode(digest).is_err() {
                    return Err(RiskError::Config(format!(
                        "artifacts.{} must be 64 hex characters",
                        key
                    )));
                }
            }
        }
        if self.server.max_body_size == 0 {
            return Err(RiskError::Config("server.max_body_size must be positive".into()));
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        RiskError::Config(format!("{}{}='{}' is invalid: {}", ENV_PREFIX, key, value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_point_at_hub_repo() {
        let config = AppConfig::default();
        assert_eq!(config.artifacts.repo_id, "barisetiawan51/stacking-model-100");
        assert_eq!(config.artifacts.revision, "main");
        assert!(config.explanations_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_each_format() {
        let json = r#"{"server": {"port": 9000}, "explanations_enabled": false}"#;
        let config = AppConfig::parse(Path::new("c.json"), json).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(!config.explanations_enabled);
        assert_eq!(config.server.host, "127.0.0.1");

        let yaml = "artifacts:\n  revision: v2\nlog_format: json\n";
        let config = AppConfig::parse(Path::new("c.yml"), yaml).unwrap();
        assert_eq!(config.artifacts.revision, "v2");
        assert_eq!(config.log_format, LogFormat::Json);

        let toml = "[artifacts]\nmodel_file = \"m.yaml\"\nmax_retries = 0\n";
        let config = AppConfig::parse(Path::new("c.toml"), toml).unwrap();
        assert_eq!(config.artifacts.model_file, "m.yaml");
        assert_eq!(config.artifacts.max_retries, 0);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = AppConfig::parse(Path::new("c.ini"), "").unwrap_err();
        assert!(matches!(err, RiskError::Config(_)));
    }

    #[test]
    fn test_overrides_apply_over_file_values() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "3000"),
            ("EXPLANATIONS", "false"),
            ("LOCAL_DIR", "/srv/models"),
            ("LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(!config.explanations_enabled);
        assert_eq!(config.artifacts.local_dir, Some(PathBuf::from("/srv/models")));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("CARDIO_PORT"));
    }

    #[test]
    fn test_validate_rejects_bad_digest_and_url() {
        let mut config = AppConfig::default();
        config.artifacts.model_sha256 = Some("abc".into());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.artifacts.hub_url = "ftp://example".into();
        assert!(config.validate().is_err());

        config.artifacts.local_dir = Some(PathBuf::from("/models"));
        assert!(config.validate().is_ok());
    }
}
