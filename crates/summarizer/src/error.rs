use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SummarizerError>;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("summarization service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed summarization response: {0}")]
    MalformedResponse(String),

    #[error("summarization call timed out after {0:?}")]
    Timeout(Duration),
}
