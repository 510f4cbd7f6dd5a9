//! Error types for archive requests.

/// Archive request failure.
///
/// These never fail a build: the resolver logs them and falls back to an
/// empty archive URL.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid CDX response: {0}")]
    Json(#[from] serde_json::Error),
}
