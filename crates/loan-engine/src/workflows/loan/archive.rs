use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

/// Long-term storage for accepted salary documents.
#[async_trait]
pub trait DocumentArchive: Send + Sync + Debug {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), ArchiveError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("object key '{0}' is not a relative path")]
    InvalidKey(String),
    #[error("failed to store '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Stores objects as `<root>/<bucket>/<key>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct FilesystemArchive {
    root: PathBuf,
}

impl FilesystemArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, ArchiveError> {
        for segment in [bucket, key] {
            let path = Path::new(segment);
            let relative = !segment.is_empty()
                && path
                    .components()
                    .all(|component| matches!(component, Component::Normal(_)));
            if !relative {
                return Err(ArchiveError::InvalidKey(segment.to_string()));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl DocumentArchive for FilesystemArchive {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), ArchiveError> {
        let path = self.object_path(bucket, key)?;
        let io_err = |source| ArchiveError::Io {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, bytes).await.map_err(io_err)?;
        tracing::debug!(path = %path.display(), "archived document");
        Ok(())
    }
}
