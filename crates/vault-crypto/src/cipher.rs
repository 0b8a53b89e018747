//! AES-256-CBC encryption of whole files
//!
//! Output format (binary):
//! ```text
//! [16 bytes: random IV][ciphertext, PKCS#7 padded to 16-byte blocks]
//! ```

use aes::Aes256;
use cbc::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut,
    KeyIvInit,
};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::random::random_bytes;
use crate::{IV_SIZE, KEY_SIZE};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// A 256-bit AES key derived from a password. Zeroized on drop.
#[derive(Clone)]
pub struct AesKey {
    bytes: [u8; KEY_SIZE],
}

impl AesKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for AesKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive the file key as a single unsalted SHA-256 pass over the password.
///
/// Any client holding the password derives the same key, which is what lets
/// a file encrypted on one machine be decrypted on another.
pub fn derive_key(password: &str) -> AesKey {
    let mut digest = Sha256::digest(password.as_bytes());
    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&digest);
    digest.as_mut_slice().zeroize();
    AesKey::from_bytes(bytes)
}

/// Generate a fresh IV. Must never be reused under the same key.
pub fn generate_iv() -> CryptoResult<[u8; IV_SIZE]> {
    random_bytes::<IV_SIZE>()
}

/// Encrypt `plaintext` under the key derived from `password`.
///
/// Returns `[IV][ciphertext]`. Two calls with identical inputs produce
/// different output because the IV is random.
pub fn encrypt(plaintext: &[u8], password: &str) -> CryptoResult<Vec<u8>> {
    let key = derive_key(password);
    let iv = generate_iv()?;

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut result = Vec::with_capacity(IV_SIZE + ciphertext.len());
    result.extend_from_slice(&iv);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Blobs shorter than the IV are rejected before any key derivation.
/// A padding failure is the only signal for a wrong password, so it cannot
/// be told apart from corrupted data.
pub fn decrypt(blob: &[u8], password: &str) -> CryptoResult<Vec<u8>> {
    if blob.len() < IV_SIZE {
        return Err(CryptoError::InputTooShort(blob.len()));
    }

    let (iv, ciphertext) = blob.split_at(IV_SIZE);
    let key = derive_key(password);

    Aes256CbcDec::new(key.as_bytes().into(), GenericArray::from_slice(iv))
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::AuthenticationOrCorruption)
}
