use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures on the completion path. Each one ends up as a single warning line
/// in the UI, so the messages are written for the user.
#[derive(Debug, Error)]
pub enum Error {
    #[error("completion client is not configured")]
    NotConfigured,

    #[error("no API credential set (export AUTH_TOKEN_OPEN_AI)")]
    MissingCredential,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
