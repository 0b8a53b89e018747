//! Session token generation

use crate::error::CryptoResult;
use crate::random::random_bytes;
use crate::TOKEN_SIZE;

/// Generate an unguessable session identifier: 32 CSPRNG bytes, hex-encoded.
pub fn generate_token() -> CryptoResult<String> {
    let bytes = random_bytes::<TOKEN_SIZE>()?;
    Ok(hex::encode(bytes))
}
