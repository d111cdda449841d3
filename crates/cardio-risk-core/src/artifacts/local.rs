//! Directory-backed artifact store

use std::path::{Path, PathBuf};

use super::{relative_path, verify_checksum, ArtifactBlob, ArtifactRef, ArtifactStore};
use crate::error::ArtifactError;

/// Serves artifacts from files in one directory
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl ArtifactStore for LocalArtifactStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch(&self, artifact: &ArtifactRef) -> Result<ArtifactBlob, ArtifactError> {
        let path = self.root.join(relative_path(&artifact.name)?);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(ArtifactError::Io(e)),
        };
        verify_checksum(artifact, &bytes)?;

        tracing::debug!(
            artifact = %artifact.name,
            path = %path.display(),
            size = bytes.len(),
            "Loaded artifact from local directory"
        );

        Ok(ArtifactBlob {
            name: artifact.name.clone(),
            bytes,
            source: self.name().to_string(),
            path: Some(path),
        })
    }
}
