use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event stream connection refused: HTTP {0}")]
    Connect(u16),

    #[error("message post rejected: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
