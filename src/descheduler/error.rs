//! Error types for the descheduler.
//!
//! Strategy runs never fail as a whole; these errors surface from the
//! collaborators around them (listing, eviction, configuration).

use thiserror::Error;

/// Error type for descheduler operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Policy document rejected
    #[error("Policy error: {0}")]
    Policy(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error reading configuration files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 404)
    }

    /// Check if the API server rejected the request because a disruption
    /// budget does not allow it right now.
    pub fn is_too_many_requests(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 429)
    }

    /// Check if a later pass could succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube(e) => {
                matches!(
                    e,
                    kube::Error::Api(api_err) if api_err.code >= 500 || api_err.code == 429
                ) || matches!(e, kube::Error::Service(_))
            }
            Error::Config(_) | Error::Policy(_) | Error::Serialization(_) | Error::Io(_) => false,
        }
    }
}

/// Result type alias for descheduler operations
pub type Result<T> = std::result::Result<T, Error>;
