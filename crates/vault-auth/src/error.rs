use thiserror::Error;
use vault_core::VaultError;
use vault_crypto::CryptoError;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already exists")]
    AlreadyExists,

    /// Deliberately identical for unknown users and wrong passwords
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("user registry I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AuthError> for VaultError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AlreadyExists => VaultError::AlreadyExists,
            AuthError::InvalidCredentials => VaultError::InvalidCredentials,
            AuthError::Crypto(e) => e.into(),
            AuthError::Io(e) => VaultError::Io(e),
        }
    }
}
