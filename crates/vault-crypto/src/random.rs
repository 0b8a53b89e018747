//! OS-backed randomness

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// Fill `N` bytes from the operating system CSPRNG.
pub fn random_bytes<const N: usize>() -> CryptoResult<[u8; N]> {
    let mut buf = [0u8; N];
    OsRng.try_fill_bytes(&mut buf).map_err(|e| {
        tracing::error!("OS random source failed: {e}");
        CryptoError::RandomSource(e.to_string())
    })?;
    Ok(buf)
}
