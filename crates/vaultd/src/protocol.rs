//! The vault protocol: authenticated operations over the credential and blob stores
//!
//! Every operation that touches stored objects resolves the session token to
//! an owner first. The owner only ever comes from the credential store, never
//! from the request, so one user cannot name another user's objects.

use tracing::{debug, warn};
use vault_auth::CredentialStore;
use vault_core::config::AuthConfig;
use vault_core::{ObjectMeta, SessionToken, VaultError, VaultResult};
use vault_storage::BlobStore;

/// Input-shape limits enforced before any store is touched
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub min_username_len: usize,
    pub min_password_len: usize,
}

impl From<&AuthConfig> for Limits {
    fn from(cfg: &AuthConfig) -> Self {
        Self {
            min_username_len: cfg.min_username_len,
            min_password_len: cfg.min_password_len,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        (&AuthConfig::default()).into()
    }
}

pub struct VaultService {
    credentials: CredentialStore,
    blobs: BlobStore,
    limits: Limits,
}

impl VaultService {
    pub fn new(credentials: CredentialStore, blobs: BlobStore, limits: Limits) -> Self {
        Self {
            credentials,
            blobs,
            limits,
        }
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub async fn register(&self, username: &str, password: &str) -> VaultResult<()> {
        check_present(username, password)?;
        check_username(username, self.limits.min_username_len)?;
        if password.chars().count() < self.limits.min_password_len {
            return Err(VaultError::validation(format!(
                "password must be at least {} characters",
                self.limits.min_password_len
            )));
        }
        self.credentials.register(username, password).await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> VaultResult<SessionToken> {
        check_present(username, password)?;
        Ok(self.credentials.login(username, password).await?)
    }

    /// Store already-encrypted bytes under the caller's namespace.
    ///
    /// Returns the canonical stored name (logical name plus `.enc`).
    pub async fn upload(
        &self,
        token: &SessionToken,
        logical_name: &str,
        bytes: &[u8],
    ) -> VaultResult<String> {
        let owner = self.authorize(token).await?;
        check_logical_name(logical_name)?;
        Ok(self.blobs.put(&owner, logical_name, bytes).await?)
    }

    pub async fn download(&self, token: &SessionToken, logical_name: &str) -> VaultResult<Vec<u8>> {
        let owner = self.authorize(token).await?;
        check_logical_name(logical_name)?;
        Ok(self.blobs.get(&owner, logical_name).await?)
    }

    pub async fn list(&self, token: &SessionToken) -> VaultResult<Vec<ObjectMeta>> {
        let owner = self.authorize(token).await?;
        Ok(self.blobs.list(&owner).await?)
    }

    /// Never fails: unknown tokens are ignored.
    pub async fn logout(&self, token: &SessionToken) {
        self.credentials.logout(token).await;
    }

    async fn authorize(&self, token: &SessionToken) -> VaultResult<String> {
        if token.is_empty() {
            return Err(VaultError::Unauthorized);
        }
        match self.credentials.validate(token).await {
            Some(owner) => {
                debug!(owner = %owner, "session validated");
                Ok(owner)
            }
            None => {
                warn!(token = ?token, "rejected unknown session token");
                Err(VaultError::Unauthorized)
            }
        }
    }
}

fn check_present(username: &str, password: &str) -> VaultResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(VaultError::validation("username and password are required"));
    }
    Ok(())
}

/// Usernames become directory names, so they are kept to a safe alphabet.
fn check_username(username: &str, min_len: usize) -> VaultResult<()> {
    if username.chars().count() < min_len {
        return Err(VaultError::validation(format!(
            "username must be at least {min_len} characters"
        )));
    }
    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !allowed || username.starts_with('.') {
        return Err(VaultError::validation(
            "username may only contain letters, digits, '_', '-' and '.', and may not start with '.'",
        ));
    }
    Ok(())
}

fn check_logical_name(name: &str) -> VaultResult<()> {
    if name.is_empty() {
        return Err(VaultError::validation("filename is required"));
    }
    if name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control)
    {
        return Err(VaultError::validation(format!(
            "filename must be a plain file name: {name:?}"
        )));
    }
    Ok(())
}
