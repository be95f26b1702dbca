use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwitterWrappedError>;

#[derive(Debug, Error)]
pub enum TwitterWrappedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No tweet data available for @{username}")]
    NoData { username: String },
}

impl From<reqwest::Error> for TwitterWrappedError {
    fn from(err: reqwest::Error) -> Self {
        TwitterWrappedError::Network(err.to_string())
    }
}
