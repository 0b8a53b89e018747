//! vault-crypto: stateless primitives protecting credentials and file contents
//!
//! Stored object framing (bit-exact, shared by every client):
//! ```text
//! [16 bytes: random IV][N bytes: AES-256-CBC ciphertext, PKCS#7 padded]
//! key = SHA-256(password)
//! ```
//!
//! Password records: `digest = hex(SHA-256(salt_hex || password))` with a
//! 16-byte random salt stored hex-encoded next to the digest.
//!
//! Neither the key derivation nor the password digest applies stretching,
//! and CBC carries no integrity tag: a wrong password and a corrupted blob
//! both surface as [`CryptoError::AuthenticationOrCorruption`].

pub mod cipher;
pub mod error;
pub mod password;
pub mod random;
pub mod token;

pub use cipher::{decrypt, derive_key, encrypt, generate_iv, AesKey};
pub use error::{CryptoError, CryptoResult};
pub use password::{generate_salt, hash_password};
pub use token::generate_token;

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the CBC initialization vector prepended to every ciphertext
pub const IV_SIZE: usize = 16;

/// Random bytes behind each password salt
pub const SALT_SIZE: usize = 16;

/// Random bytes behind each session token
pub const TOKEN_SIZE: usize = 32;
