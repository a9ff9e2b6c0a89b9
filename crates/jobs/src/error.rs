use thiserror::Error;

pub type Result<T> = std::result::Result<T, JobsError>;

#[derive(Error, Debug)]
pub enum JobsError {
    #[error("invalid source {0}: not an existing directory")]
    InvalidSource(String),

    #[error("walk failed: {0}")]
    WalkError(#[from] atlas_walker::WalkerError),

    #[error("{0}")]
    Other(String),
}
