//! Error types for the embodied backend boundary.

use thiserror::Error;

/// Errors that can occur while talking to the simulation backend.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Asset path does not resolve to a readable file
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Asset exists but could not be parsed
    #[error("Asset error: {0}")]
    AssetError(String),

    /// Navmesh file exists but is malformed
    #[error("Navmesh error: {0}")]
    NavmeshError(String),

    /// Invalid scene graph operation (bad node index, etc.)
    #[error("Scene graph error: {0}")]
    SceneGraph(String),
}

impl EnvError {
    /// Creates an asset parse error.
    pub fn asset(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::AssetError(format!("{}: {}", path, reason))
    }

    /// Creates a not-found error.
    pub fn not_found(path: impl std::fmt::Display) -> Self {
        Self::AssetNotFound(path.to_string())
    }
}
