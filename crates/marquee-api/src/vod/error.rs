use thiserror::Error;

/// Errors from a VOD aggregator site.
#[derive(Debug, Error)]
pub enum VodError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid site URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}
