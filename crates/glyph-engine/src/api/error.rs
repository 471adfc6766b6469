use thiserror::Error;

/// Failure to load a game's session payload.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid payload: {0}")]
    Invalid(String),
    #[error("this game does not accept a payload")]
    Unsupported,
}
