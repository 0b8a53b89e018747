pub mod api;
pub mod config;
pub mod error;
pub mod types;

pub use error::{ErrorKind, VaultError, VaultResult};
pub use types::{ObjectMeta, SessionToken};

/// Suffix carried by every object name on disk
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Append the encrypted-object suffix unless the name already ends with it.
pub fn canonical_name(logical_name: &str) -> String {
    if logical_name.ends_with(ENCRYPTED_SUFFIX) {
        logical_name.to_string()
    } else {
        format!("{logical_name}{ENCRYPTED_SUFFIX}")
    }
}
