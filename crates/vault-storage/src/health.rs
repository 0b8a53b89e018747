//! Storage health check

use crate::blob::BlobStore;
use crate::error::StorageResult;

/// Verify the storage root is writable by round-tripping a probe file
pub async fn check_health(store: &BlobStore) -> StorageResult<()> {
    let staging = store.staging_dir();
    tokio::fs::create_dir_all(&staging).await?;
    let probe = staging.join(format!("health-{}.probe", uuid::Uuid::new_v4()));
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

/// Returns true if storage is writable, false otherwise (non-panicking)
pub async fn is_healthy(store: &BlobStore) -> bool {
    check_health(store).await.is_ok()
}
