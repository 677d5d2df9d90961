//! Artifact store
//!
//! One pre-built XML document per endpoint, read verbatim from the resource
//! directory on every request.

use hyper::body::Bytes;
use std::path::PathBuf;
use tokio::fs;

use super::endpoint::Endpoint;
use super::error::DispatchError;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, endpoint: Endpoint) -> PathBuf {
        self.root.join(endpoint.artifact_name())
    }

    pub async fn load(&self, endpoint: Endpoint) -> Result<Bytes, DispatchError> {
        fs::read(self.path_for(endpoint))
            .await
            .map(Bytes::from)
            .map_err(|source| DispatchError::ArtifactUnavailable { endpoint, source })
    }

    /// Endpoints whose artifact file is missing
    pub fn missing(&self) -> Vec<Endpoint> {
        Endpoint::ALL
            .into_iter()
            .filter(|endpoint| !self.path_for(*endpoint).is_file())
            .collect()
    }
}
