use thiserror::Error;

/// Errors surfaced by the version-calculation pipeline.
///
/// These bubble up to the caller unmodified; the core never retries or logs
/// on their behalf (spec §7).
#[derive(Debug, Error)]
pub enum VersionCalculationError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("repository error: {0}")]
    Repository(#[from] git2::Error),

    #[error("repository has no commits reachable from HEAD")]
    NoCommits,

    #[error("ambiguous base version: {0}")]
    AmbiguousVersion(String),

    #[error("calculation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, VersionCalculationError>;
