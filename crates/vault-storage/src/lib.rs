//! vault-storage: filesystem blob store for encrypted objects
//!
//! Layout:
//! ```text
//! <root>/<owner>/<name>.enc   one file per stored object, bytes verbatim
//! <root>/.staging/            in-flight uploads, renamed into place
//! ```
//!
//! The store never authorizes and never decrypts: callers pass an owner they
//! have already authenticated, and the bytes are opaque.

pub mod blob;
pub mod error;
pub mod health;

pub use blob::BlobStore;
pub use error::{StorageError, StorageResult};
pub use health::check_health;
