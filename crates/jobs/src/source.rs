use crate::error::{JobsError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Boundary to the repository source provider: turns a source descriptor into
/// a local, fully materialized directory before the walker runs. Fetch
/// failures become a failed job without the walker ever starting.
#[async_trait]
pub trait ProvideSource: Send + Sync {
    async fn materialize(&self, source: &str) -> Result<PathBuf>;
}

/// Provider for sources that already are local directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPath;

#[async_trait]
impl ProvideSource for LocalPath {
    async fn materialize(&self, source: &str) -> Result<PathBuf> {
        let path = PathBuf::from(source);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(path),
            _ => Err(JobsError::InvalidSource(source.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_existing_directories() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().to_string_lossy().into_owned();
        let path = LocalPath.materialize(&source).await.unwrap();
        assert_eq!(path, temp.path());
    }

    #[tokio::test]
    async fn rejects_missing_paths_and_files() {
        assert!(matches!(
            LocalPath.materialize("/definitely/not/here").await,
            Err(JobsError::InvalidSource(_))
        ));

        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("f.txt");
        tokio::fs::write(&file, "x").await.unwrap();
        assert!(matches!(
            LocalPath
                .materialize(&file.to_string_lossy())
                .await,
            Err(JobsError::InvalidSource(_))
        ));
    }
}
