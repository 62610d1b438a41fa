use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot resolve a match from an empty candidate list")]
    EmptyCandidates,

    #[error("invalid noise pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
