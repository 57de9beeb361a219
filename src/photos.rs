//! Storage collaborator port for photo bytes.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

#[derive(Debug)]
pub enum PhotoError {
    NotFound,
    /// The bucket/path pair cannot name an object in this store.
    InvalidReference(String),
    Io(std::io::Error),
    Other(String),
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NotFound => write!(f, "photo not found"),
            PhotoError::InvalidReference(r) => write!(f, "invalid photo reference: {r}"),
            PhotoError::Io(e) => write!(f, "photo I/O error: {e}"),
            PhotoError::Other(msg) => write!(f, "photo fetch failed: {msg}"),
        }
    }
}

impl std::error::Error for PhotoError {}

/// Fetches raw photo bytes by `(bucket, path)`. Timeouts and retries belong to
/// the implementation; the renderer treats every error the same way.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn fetch_bytes(&self, bucket: &str, path: &str) -> Result<Vec<u8>, PhotoError>;
}

/// Photos stored on disk as `<root>/<bucket>/<path>`.
pub struct DirPhotoStore {
    root: PathBuf,
}

impl DirPhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, PhotoError> {
        let mut out = self.root.clone();
        for part in [bucket, path] {
            let rel = Path::new(part);
            if !rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
            {
                return Err(PhotoError::InvalidReference(format!("{bucket}/{path}")));
            }
            out.push(rel);
        }
        Ok(out)
    }
}

#[async_trait]
impl PhotoStore for DirPhotoStore {
    async fn fetch_bytes(&self, bucket: &str, path: &str) -> Result<Vec<u8>, PhotoError> {
        let full = self.resolve(bucket, path)?;
        tokio::fs::read(&full).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PhotoError::NotFound,
            _ => PhotoError::Io(e),
        })
    }
}
