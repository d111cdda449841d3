//! Artifact stores
//!
//! An [`ArtifactStore`] resolves an artifact name to raw bytes. Stores are
//! composed with [`ArtifactChain`]: a local directory is usually consulted
//! before the remote hub.
//!
//! Stores return [`ArtifactError::NotFound`] when they simply do not have an
//! artifact, which lets a chain move on to the next store. Any other error
//! stops the chain.

pub mod chain;
pub mod hub;
pub mod local;

pub use chain::ArtifactChain;
pub use hub::HubArtifactStore;
pub use local::LocalArtifactStore;

use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ArtifactConfig;
use crate::error::ArtifactError;

/// Name of an artifact plus an optional pinned digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    /// Lowercase hex SHA-256 the bytes must match
    pub sha256: Option<String>,
}

impl ArtifactRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sha256: None,
        }
    }

    pub fn with_sha256(mut self, digest: Option<String>) -> Self {
        self.sha256 = digest.map(|d| d.to_lowercase());
        self
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Bytes of a fetched artifact and where they came from
#[derive(Debug, Clone)]
pub struct ArtifactBlob {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Store that served the bytes
    pub source: String,
    /// On-disk location, when the bytes live in a file
    pub path: Option<PathBuf>,
}

impl ArtifactBlob {
    /// Hex SHA-256 of the bytes
    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }

    /// Decode the bytes by file extension (`.yaml`/`.yml` or JSON otherwise)
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ArtifactError> {
        decode(&self.name, &self.bytes)
    }
}

/// A source of model artifacts
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync + fmt::Debug {
    /// Name of the store for logs and diagnostics
    fn name(&self) -> &str;

    /// Fetch an artifact, verifying its digest when one is pinned
    ///
    /// Returns [`ArtifactError::NotFound`] when the store has no such
    /// artifact.
    async fn fetch(&self, artifact: &ArtifactRef) -> Result<ArtifactBlob, ArtifactError>;
}

/// Hex-encoded SHA-256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Check bytes against the digest pinned on `artifact`, if any
pub fn verify_checksum(artifact: &ArtifactRef, bytes: &[u8]) -> Result<(), ArtifactError> {
    let Some(expected) = artifact.sha256.as_deref() else {
        return Ok(());
    };
    let actual = sha256_hex(bytes);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ArtifactError::ChecksumMismatch {
            name: artifact.name.clone(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Deserialize artifact bytes, picking the format from the file name
pub fn decode<T: DeserializeOwned>(name: &str, bytes: &[u8]) -> Result<T, ArtifactError> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => {
            serde_yaml::from_slice(bytes).map_err(|e| ArtifactError::corrupt(name, e.to_string()))
        }
        "json" | "" => {
            serde_json::from_slice(bytes).map_err(|e| ArtifactError::corrupt(name, e.to_string()))
        }
        "pkl" | "pickle" | "joblib" => Err(ArtifactError::incompatible(
            name,
            "pickled artifacts are not supported; export the model to JSON or YAML",
        )),
        other => Err(ArtifactError::incompatible(
            name,
            format!("unsupported artifact format '{}', expected json, yaml or yml", other),
        )),
    }
}

/// Interpret an artifact name as a path that stays inside a store root
pub(crate) fn relative_path(name: &str) -> Result<&Path, ArtifactError> {
    let relative = Path::new(name);
    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)));
    if name.is_empty() || escapes {
        return Err(ArtifactError::NotFound(format!(
            "{} (invalid artifact name)",
            name
        )));
    }
    Ok(relative)
}

/// Build the store chain described by the configuration
///
/// The local directory, when set, is consulted before the hub.
pub fn store_from_config(config: &ArtifactConfig) -> Result<ArtifactChain, ArtifactError> {
    let mut chain = ArtifactChain::new();
    if let Some(dir) = &config.local_dir {
        chain.add_store(LocalArtifactStore::new(dir));
    }
    if !config.repo_id.trim().is_empty() {
        chain.add_store(HubArtifactStore::from_config(config)?);
    }
    Ok(chain)
}
