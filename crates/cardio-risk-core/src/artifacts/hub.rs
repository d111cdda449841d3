//! Hub-backed artifact store
//!
//! Downloads files from a model hub repository at
//! `{hub_url}/{repo_id}/resolve/{revision}/{file}` and keeps them in an
//! on-disk cache. A cached file is served without touching the network as
//! long as it still matches the pinned digest.
//!
//! Features:
//! - Retry with exponential backoff on transient failures
//! - Atomic cache writes (temporary file, then rename)
//! - SHA-256 verification of downloaded bytes

use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;

use super::{relative_path, verify_checksum, ArtifactBlob, ArtifactRef, ArtifactStore};
use crate::config::ArtifactConfig;
use crate::error::ArtifactError;

/// Settings for [`HubArtifactStore`]
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub hub_url: String,
    pub repo_id: String,
    pub revision: String,
    pub cache_dir: PathBuf,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for HubConfig {
    fn default() -> Self {
        let artifacts = ArtifactConfig::default();
        Self {
            hub_url: artifacts.hub_url,
            repo_id: artifacts.repo_id,
            revision: artifacts.revision,
            cache_dir: artifacts.cache_dir,
            timeout_ms: artifacts.timeout_ms,
            max_retries: artifacts.max_retries,
            initial_backoff_ms: 250,
            max_backoff_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Artifact store that downloads from a model hub
#[derive(Debug, Clone)]
pub struct HubArtifactStore {
    client: Client,
    config: HubConfig,
}

impl HubArtifactStore {
    pub fn from_config(artifacts: &ArtifactConfig) -> Result<Self, ArtifactError> {
        Self::with_config(HubConfig {
            hub_url: artifacts.hub_url.clone(),
            repo_id: artifacts.repo_id.clone(),
            revision: artifacts.revision.clone(),
            cache_dir: artifacts.cache_dir.clone(),
            timeout_ms: artifacts.timeout_ms,
            max_retries: artifacts.max_retries,
            ..HubConfig::default()
        })
    }

    pub fn with_config(config: HubConfig) -> Result<Self, ArtifactError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_idle_timeout(Duration::from_secs(30))
            .user_agent(concat!("cardio-risk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArtifactError::Connection(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Download URL of a file in the configured repository
    pub fn url_for(&self, name: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.config.hub_url.trim_end_matches('/'),
            self.config.repo_id,
            self.config.revision,
            name
        )
    }

    /// Cache location of a file: `{cache_dir}/{owner}--{repo}/{revision}/{file}`
    pub fn cache_path(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        Ok(self
            .config
            .cache_dir
            .join(self.config.repo_id.replace('/', "--"))
            .join(&self.config.revision)
            .join(relative_path(name)?))
    }

    async fn read_cached(&self, artifact: &ArtifactRef, path: &Path) -> Option<Vec<u8>> {
        let bytes = tokio::fs::read(path).await.ok()?;
        match verify_checksum(artifact, &bytes) {
            Ok(()) => Some(bytes),
            Err(e) => {
                tracing::warn!(
                    artifact = %artifact.name,
                    path = %path.display(),
                    error = %e,
                    "Cached artifact is stale, downloading again"
                );
                None
            }
        }
    }

    async fn write_cache(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut partial = path.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, path).await
    }

    /// Download with retry logic
    async fn download(&self, url: &str) -> Result<Vec<u8>, ArtifactError> {
        let mut last_error = None;
        let mut backoff_ms = self.config.initial_backoff_ms;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    attempt = attempt,
                    backoff_ms = backoff_ms,
                    url = %url,
                    "Retrying artifact download"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms as f64 * self.config.backoff_multiplier) as u64;
                backoff_ms = backoff_ms.min(self.config.max_backoff_ms);
            }

            match self.send(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    tracing::warn!(attempt = attempt, error = %e, url = %url, "Artifact download failed");
                    let permanent = is_permanent_error(&e);
                    last_error = Some(e);
                    if permanent {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ArtifactError::Connection(format!("no attempt made for {}", url))))
    }

    async fn send(&self, url: &str) -> Result<Vec<u8>, ArtifactError> {
        let response = self.client.get(url).send().await.map_err(|e| classify(url, e))?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await.map_err(|e| classify(url, e))?;
            Ok(body.to_vec())
        } else if status == StatusCode::NOT_FOUND {
            Err(ArtifactError::NotFound(url.to_string()))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ArtifactError::Connection(format!(
                "Access denied ({}) for {}",
                status, url
            )))
        } else {
            Err(ArtifactError::Connection(format!("Unexpected status {} for {}", status, url)))
        }
    }
}

fn classify(url: &str, error: reqwest::Error) -> ArtifactError {
    if error.is_timeout() {
        ArtifactError::Timeout(url.to_string())
    } else {
        ArtifactError::Connection(format!("{}: {}", url, error))
    }
}

/// Errors that another attempt cannot fix
fn is_permanent_error(error: &ArtifactError) -> bool {
    match error {
        ArtifactError::NotFound(_) => true,
        ArtifactError::Connection(msg) => msg.starts_with("Access denied"),
        _ => false,
    }
}

#[async_trait::async_trait]
impl ArtifactStore for HubArtifactStore {
    fn name(&self) -> &str {
        "hub"
    }

    async fn fetch(&self, artifact: &ArtifactRef) -> Result<ArtifactBlob, ArtifactError> {
        let path = self.cache_path(&artifact.name)?;

        if let Some(bytes) = self.read_cached(artifact, &path).await {
            tracing::debug!(artifact = %artifact.name, path = %path.display(), "Using cached artifact");
            return Ok(ArtifactBlob {
                name: artifact.name.clone(),
                bytes,
                source: self.name().to_string(),
                path: Some(path),
            });
        }

        let url = self.url_for(&artifact.name);
        let bytes = self.download(&url).await?;
        verify_checksum(artifact, &bytes)?;

        let cached = match self.write_cache(&path, &bytes).await {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not cache artifact");
                None
            }
        };

        tracing::info!(
            artifact = %artifact.name,
            url = %url,
            size = bytes.len(),
            "Downloaded artifact"
        );

        Ok(ArtifactBlob {
            name: artifact.name.clone(),
            bytes,
            source: self.name().to_string(),
            path: cached,
        })
    }
}
