use thiserror::Error;

/// Failures raised by the post and engagement services.
///
/// Geolocation and client-IP resolution never surface here; they degrade to
/// placeholder values instead.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
