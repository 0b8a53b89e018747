use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Failure taxonomy shared by every vault component.
///
/// Each variant is scoped to the single request that produced it; none of
/// them is fatal to the process.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Malformed or missing input. No side effects happened.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("username already exists")]
    AlreadyExists,

    /// Unknown user and wrong password are reported identically.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("unauthorized: please login first")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("random source unavailable: {0}")]
    RandomSource(String),

    #[error("ciphertext too short: {0} bytes (missing IV)")]
    InputTooShort(usize),

    /// Padding check failed after decryption: wrong password or corrupted data.
    #[error("decryption failed: wrong password or corrupted data")]
    AuthenticationOrCorruption,
}

/// Stable, wire-visible name of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    AlreadyExists,
    InvalidCredentials,
    Unauthorized,
    NotFound,
    Io,
    RandomSource,
    InputTooShort,
    AuthenticationOrCorruption,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Io => "io",
            ErrorKind::RandomSource => "random_source",
            ErrorKind::InputTooShort => "input_too_short",
            ErrorKind::AuthenticationOrCorruption => "authentication_or_corruption",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Validation(_) => ErrorKind::Validation,
            VaultError::AlreadyExists => ErrorKind::AlreadyExists,
            VaultError::InvalidCredentials => ErrorKind::InvalidCredentials,
            VaultError::Unauthorized => ErrorKind::Unauthorized,
            VaultError::NotFound(_) => ErrorKind::NotFound,
            VaultError::Io(_) => ErrorKind::Io,
            VaultError::RandomSource(_) => ErrorKind::RandomSource,
            VaultError::InputTooShort(_) => ErrorKind::InputTooShort,
            VaultError::AuthenticationOrCorruption => ErrorKind::AuthenticationOrCorruption,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        VaultError::Validation(msg.into())
    }
}
