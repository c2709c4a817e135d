//! Error types.
//!
//! `ServiceError` is what a [`SchedulingService`](crate::service::SchedulingService)
//! returns. `BoardError` is the crate-level error. The orchestrator converts
//! both into user-facing notices; neither reaches rendering code.

use thiserror::Error;

/// Failure reported by the external scheduling service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service could not be reached or is temporarily down.
    #[error("scheduling service unavailable: {0}")]
    Unavailable(String),
    /// A referenced entity does not exist on the service side.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    /// The service refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
    /// Transport or decoding failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("granularity must be a positive number of minutes, got {0}")]
    InvalidGranularity(u32),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("another schedule change is still in progress")]
    Busy,
    #[error("planning data has not been loaded")]
    NotLoaded,
    #[error("unknown encounter: {0}")]
    UnknownEncounter(String),
    #[error("unknown division: {0}")]
    UnknownDivision(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}
