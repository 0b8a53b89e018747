use thiserror::Error;
use vault_core::VaultError;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    /// Owner or object name that is not a single plain path component
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for VaultError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => VaultError::NotFound(name),
            StorageError::InvalidName(name) => {
                VaultError::Validation(format!("invalid name: {name:?}"))
            }
            StorageError::Io(e) => VaultError::Io(e),
        }
    }
}
