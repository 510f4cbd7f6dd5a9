//! Error types for markup passes.

/// Fatal error raised by a markup pass on malformed input.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// `{% linkcard %}` without a URL.
    #[error("linkcard tag requires a URL")]
    MissingLinkCardUrl,

    /// Email address not of the form `user@domain`.
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Email domain without a `.` separating base and TLD.
    #[error("Invalid email domain format: {0}")]
    InvalidEmailDomain(String),

    /// Decorator pattern that does not compile.
    #[error("Invalid href pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
