//! Error types for RouteKeeper.

use thiserror::Error;

/// Errors that can occur while guarding routes.
#[derive(Error, Debug)]
pub enum KeeperError {
    /// A route configuration problem escalated by a strict warning policy.
    #[error("route configuration error: {0}")]
    Configuration(String),

    /// Shared context was read outside a mounted `RouteKeeper`.
    #[error("RouteKeeper context is missing; tooling must be rendered inside RouteKeeper")]
    MissingContext,

    /// Durable storage rejected an operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// Failed to (de)serialize a persisted value.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KeeperError {
    /// Whether this error indicates a wiring defect rather than a data problem.
    pub fn is_wiring_defect(&self) -> bool {
        matches!(self, KeeperError::MissingContext)
    }

    /// Whether this error came from route configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, KeeperError::Configuration(_))
    }
}
