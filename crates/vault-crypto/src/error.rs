use thiserror::Error;
use vault_core::VaultError;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// The OS CSPRNG could not be read. Never substituted with a weaker source.
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    #[error("ciphertext too short: {0} bytes (missing IV)")]
    InputTooShort(usize),

    #[error("decryption failed: wrong password or corrupted data")]
    AuthenticationOrCorruption,
}

impl From<CryptoError> for VaultError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::RandomSource(msg) => VaultError::RandomSource(msg),
            CryptoError::InputTooShort(len) => VaultError::InputTooShort(len),
            CryptoError::AuthenticationOrCorruption => VaultError::AuthenticationOrCorruption,
        }
    }
}
