//! Per-user object store on the local filesystem

use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use vault_core::{canonical_name, ObjectMeta};

use crate::error::{StorageError, StorageResult};

/// Directory under the root where uploads are staged before the final rename
const STAGING_DIR: &str = ".staging";

/// Reject anything that could escape its directory when joined to a path,
/// and control characters, which cannot be echoed back in HTTP headers.
fn check_component(name: &str) -> StorageResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Filesystem-backed blob store rooted at a single directory.
///
/// Each owner gets a private subdirectory, so operations on different owners
/// never touch the same files. Concurrent writes to the same object are
/// last-write-wins; a reader sees either the old or the new bytes, never a
/// mix, because every write lands through a rename.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(STAGING_DIR)).await?;
        info!(root = %root.display(), "blob store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    fn user_dir(&self, owner: &str) -> StorageResult<PathBuf> {
        check_component(owner)?;
        Ok(self.root.join(owner))
    }

    /// Resolve `(canonical name, absolute path)` for an object.
    fn object_path(&self, owner: &str, logical_name: &str) -> StorageResult<(String, PathBuf)> {
        check_component(logical_name)?;
        let name = canonical_name(logical_name);
        let path = self.user_dir(owner)?.join(&name);
        Ok((name, path))
    }

    /// Store `bytes` verbatim, replacing any object with the same canonical name.
    ///
    /// Returns the canonical name. On failure the previous object, if any,
    /// is left untouched.
    pub async fn put(&self, owner: &str, logical_name: &str, bytes: &[u8]) -> StorageResult<String> {
        let (name, path) = self.object_path(owner, logical_name)?;
        let user_dir = self.user_dir(owner)?;
        tokio::fs::create_dir_all(&user_dir).await?;

        let staging = self.staging_dir();
        tokio::fs::create_dir_all(&staging).await?;
        let tmp_path = staging.join(format!("{}.part", uuid::Uuid::new_v4()));

        if let Err(e) = write_staged(&tmp_path, bytes, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp_path.display(), "failed to remove staged upload: {cleanup}");
                }
            }
            return Err(e.into());
        }

        info!(owner, object = %name, bytes = bytes.len(), "stored object");
        Ok(name)
    }

    /// Read an object back verbatim.
    pub async fn get(&self, owner: &str, logical_name: &str) -> StorageResult<Vec<u8>> {
        let (name, path) = self.object_path(owner, logical_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(owner, object = %name, bytes = bytes.len(), "read object");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name)),
            Err(e) => Err(e.into()),
        }
    }

    /// Enumerate the owner's objects. Order follows directory enumeration.
    ///
    /// An owner that never stored anything has an empty listing.
    pub async fn list(&self, owner: &str) -> StorageResult<Vec<ObjectMeta>> {
        let dir = self.user_dir(owner)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                // Replaced or removed between readdir and stat
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !meta.is_file() {
                continue;
            }
            let last_modified: DateTime<Utc> = meta.modified()?.into();
            objects.push(ObjectMeta {
                logical_name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                last_modified,
            });
        }
        Ok(objects)
    }

    /// Whether an object exists, without reading it.
    pub async fn exists(&self, owner: &str, logical_name: &str) -> bool {
        match self.object_path(owner, logical_name) {
            Ok((_, path)) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}

/// Write to a staging file, flush it to disk, then rename over the target.
async fn write_staged(tmp_path: &Path, bytes: &[u8], target: &Path) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp_path, target).await
}
