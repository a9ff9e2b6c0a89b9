use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalkerError>;

#[derive(Error, Debug)]
pub enum WalkerError {
    #[error("invalid analysis root {0}: not an existing directory")]
    InvalidRoot(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
