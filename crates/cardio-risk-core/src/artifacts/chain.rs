//! Artifact Chain
//!
//! Combines several stores into a priority-ordered chain. Stores are tried
//! in the order they were added; the first one that does not report
//! `NotFound` wins, and any other error stops the chain.
//!
//! # Example
//!
//! ```rust,ignore
//! use cardio_risk_core::artifacts::{ArtifactChain, ArtifactRef, LocalArtifactStore};
//!
//! let chain = ArtifactChain::new()
//!     .with_store(LocalArtifactStore::new("./models"))
//!     .with_store(HubArtifactStore::from_config(&config.artifacts)?);
//!
//! let scaler = chain.fetch(&ArtifactRef::new("scaler.json")).await?;
//! ```

use std::sync::Arc;

use super::{ArtifactBlob, ArtifactRef, ArtifactStore};
use crate::error::ArtifactError;

#[derive(Default, Clone)]
pub struct ArtifactChain {
    stores: Vec<Arc<dyn ArtifactStore>>,
}

impl std::fmt::Debug for ArtifactChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactChain")
            .field("stores", &self.store_names())
            .finish()
    }
}

impl ArtifactChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a store (builder pattern); earlier stores have higher priority
    pub fn with_store<S: ArtifactStore + 'static>(mut self, store: S) -> Self {
        self.stores.push(Arc::new(store));
        self
    }

    pub fn add_store<S: ArtifactStore + 'static>(&mut self, store: S) {
        self.stores.push(Arc::new(store));
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Store names in priority order
    pub fn store_names(&self) -> Vec<&str> {
        self.stores.iter().map(|s| s.name()).collect()
    }
}

#[async_trait::async_trait]
impl ArtifactStore for ArtifactChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn fetch(&self, artifact: &ArtifactRef) -> Result<ArtifactBlob, ArtifactError> {
        for store in &self.stores {
            match store.fetch(artifact).await {
                Err(ArtifactError::NotFound(location)) => {
                    tracing::debug!(
                        store = store.name(),
                        artifact = %artifact.name,
                        location = %location,
                        "Artifact not in store, trying next"
                    );
                }
                other => return other,
            }
        }

        Err(ArtifactError::NotFound(format!(
            "{} (searched: {})",
            artifact.name,
            if self.stores.is_empty() {
                "no stores configured".to_string()
            } else {
                self.store_names().join(", ")
            }
        )))
    }
}
