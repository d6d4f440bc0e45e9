use thiserror::Error;

/// Failures the core distinguishes between. Only `Validation` ever reaches the
/// user verbatim; the rest are logged and mapped to generic messages or
/// silently degraded at the boundary that catches them.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NaveenaError {
    #[error("{0}")]
    Validation(String),

    #[error("gateway request failed: {0}")]
    Gateway(String),

    #[error("persistence unavailable: {0}")]
    Persistence(String),

    #[error("stored record is malformed: {0}")]
    Deserialization(String),
}
