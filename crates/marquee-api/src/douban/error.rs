use thiserror::Error;

/// Errors from the Douban listing client.
#[derive(Debug, Error)]
pub enum DoubanError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("minimum rating must be 0-9, got {0}")]
    InvalidRating(u8),
}
