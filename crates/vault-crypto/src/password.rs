//! Salted password digests for the user registry

use sha2::{Digest, Sha256};

use crate::error::CryptoResult;
use crate::random::random_bytes;
use crate::SALT_SIZE;

/// Generate a per-user salt: 16 CSPRNG bytes, hex-encoded.
pub fn generate_salt() -> CryptoResult<String> {
    let bytes = random_bytes::<SALT_SIZE>()?;
    Ok(hex::encode(bytes))
}

/// Hex SHA-256 digest of `salt || password`.
///
/// The salt is hashed as its hex text, exactly as stored in the registry.
/// A single pass: this defeats precomputed tables, not brute force.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
