//! vault-auth: who may talk to the vault
//!
//! - [`registry`]: durable, append-only user records (`users.dat`)
//! - [`store`]: the [`CredentialStore`], owning the registry mirror and the
//!   session table behind one lock

pub mod error;
pub mod registry;
pub mod store;

pub use error::{AuthError, AuthResult};
pub use registry::{User, UserRegistry};
pub use store::CredentialStore;
