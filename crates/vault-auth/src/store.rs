//! Credential store: user registry mirror + session table behind one lock

use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{info, warn};
use vault_core::SessionToken;

use crate::error::{AuthError, AuthResult};
use crate::registry::{User, UserRegistry};

#[derive(Default)]
struct Inner {
    /// username → User
    users: HashMap<String, User>,
    /// token → username
    sessions: HashMap<SessionToken, String>,
}

/// Owns every user record and every live session.
///
/// All reads and writes go through a single mutex, which makes register,
/// login, validate and logout linearizable with respect to each other.
/// Sessions live only in memory: a restart logs everybody out.
pub struct CredentialStore {
    registry: UserRegistry,
    inner: Mutex<Inner>,
}

impl CredentialStore {
    /// Load the registry from `data_dir`, creating the directory if needed.
    pub async fn open(data_dir: &Path) -> AuthResult<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let registry = UserRegistry::new(data_dir);
        let users = registry.load().await?;
        info!(users = users.len(), path = %registry.path().display(), "user registry loaded");

        Ok(Self {
            registry,
            inner: Mutex::new(Inner {
                users,
                sessions: HashMap::new(),
            }),
        })
    }

    /// Register a new user.
    ///
    /// Input shape (non-empty, minimum lengths) is the caller's job. The
    /// record is written to disk before it becomes visible in memory, so a
    /// failed write leaves the store exactly as it was.
    pub async fn register(&self, username: &str, password: &str) -> AuthResult<()> {
        // CPU-only work stays outside the lock
        let salt = vault_crypto::generate_salt()?;
        let password_hash = vault_crypto::hash_password(password, &salt);
        let user = User {
            username: username.to_string(),
            password_hash,
            salt,
        };

        let mut inner = self.inner.lock().await;
        if inner.users.contains_key(username) {
            return Err(AuthError::AlreadyExists);
        }
        self.registry.append(&user).await?;
        inner.users.insert(user.username.clone(), user);
        drop(inner);

        info!(username, "registered user");
        Ok(())
    }

    /// Check a password and open a new session.
    ///
    /// Unknown users and wrong passwords fail with the same error.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<SessionToken> {
        let record = {
            let inner = self.inner.lock().await;
            inner
                .users
                .get(username)
                .map(|u| (u.password_hash.clone(), u.salt.clone()))
        };

        let Some((stored_hash, salt)) = record else {
            warn!(username, "login failed");
            return Err(AuthError::InvalidCredentials);
        };
        if vault_crypto::hash_password(password, &salt) != stored_hash {
            warn!(username, "login failed");
            return Err(AuthError::InvalidCredentials);
        }

        let token = SessionToken::new(vault_crypto::generate_token()?);
        self.inner
            .lock()
            .await
            .sessions
            .insert(token.clone(), username.to_string());

        info!(username, "user logged in");
        Ok(token)
    }

    /// Owning username of a live session, if any.
    pub async fn validate(&self, token: &SessionToken) -> Option<String> {
        self.inner.lock().await.sessions.get(token).cloned()
    }

    /// End a session. Unknown or already-revoked tokens are ignored.
    pub async fn logout(&self, token: &SessionToken) {
        if let Some(username) = self.inner.lock().await.sessions.remove(token) {
            info!(username = %username, "user logged out");
        }
    }

    pub async fn user_count(&self) -> usize {
        self.inner.lock().await.users.len()
    }

    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, CredentialStore) {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::open(&tmp.path().join("data")).await.unwrap();
        (tmp, store)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (_tmp, store) = open_store().await;
        store.register("alice", "pass123").await.unwrap();

        let token = store.login("alice", "pass123").await.unwrap();
        assert_eq!(token.as_str().len(), 64);
        assert_eq!(store.validate(&token).await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (tmp, store) = open_store().await;
        store.register("alice", "pass123").await.unwrap();

        let err = store.register("alice", "other-pass").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));
        assert_eq!(store.user_count().await, 1);

        // Only one record on disk, and the original password still works
        let raw = std::fs::read_to_string(tmp.path().join("data/users.dat")).unwrap();
        assert_eq!(raw.lines().filter(|l| l.starts_with("alice:")).count(), 1);
        assert!(store.login("alice", "pass123").await.is_ok());
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let (_tmp, store) = open_store().await;
        store.register("alice", "pass123").await.unwrap();
        store.register("Alice", "pass456").await.unwrap();
        assert_eq!(store.user_count().await, 2);
        assert!(store.login("Alice", "pass123").await.is_err());
    }

    #[tokio::test]
    async fn test_login_failures_indistinguishable() {
        let (_tmp, store) = open_store().await;
        store.register("alice", "pass123").await.unwrap();

        let wrong_password = store.login("alice", "nope").await.unwrap_err();
        let unknown_user = store.login("mallory", "pass123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_user() {
        let (_tmp, store) = open_store().await;
        store.register("alice", "pass123").await.unwrap();

        let t1 = store.login("alice", "pass123").await.unwrap();
        let t2 = store.login("alice", "pass123").await.unwrap();
        assert_ne!(t1, t2);
        assert_eq!(store.session_count().await, 2);

        store.logout(&t1).await;
        assert!(store.validate(&t1).await.is_none());
        assert_eq!(store.validate(&t2).await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_logout_idempotent() {
        let (_tmp, store) = open_store().await;
        store.register("alice", "pass123").await.unwrap();
        let token = store.login("alice", "pass123").await.unwrap();

        store.logout(&token).await;
        assert!(store.validate(&token).await.is_none());
        store.logout(&token).await;
        store.logout(&SessionToken::new("never-issued")).await;
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_registry_survives_restart_sessions_do_not() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("data");

        let token = {
            let store = CredentialStore::open(&data_dir).await.unwrap();
            store.register("alice", "pass123").await.unwrap();
            store.login("alice", "pass123").await.unwrap()
        };

        let reopened = CredentialStore::open(&data_dir).await.unwrap();
        assert_eq!(reopened.user_count().await, 1);
        assert!(reopened.validate(&token).await.is_none());
        assert!(reopened.login("alice", "pass123").await.is_ok());
        assert!(matches!(
            reopened.register("alice", "x").await,
            Err(AuthError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_failed_append_registers_nobody() {
        let (tmp, store) = open_store().await;
        store.register("alice", "pass123").await.unwrap();

        // A directory in place of the registry file makes the append fail
        let registry = tmp.path().join("data/users.dat");
        std::fs::remove_file(&registry).unwrap();
        std::fs::create_dir(&registry).unwrap();

        let err = store.register("bob", "pass456").await.unwrap_err();
        assert!(matches!(err, AuthError::Io(_)), "{err}");
        assert_eq!(store.user_count().await, 1);
        assert!(matches!(
            store.login("bob", "pass456").await,
            Err(AuthError::InvalidCredentials)
        ));

        // Once the file is writable again the same name is still free
        std::fs::remove_dir(&registry).unwrap();
        store.register("bob", "pass456").await.unwrap();
        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_registration_after_torn_record_survives_restart() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(data_dir.join("users.dat"), "carol:abc").unwrap();

        {
            let store = CredentialStore::open(&data_dir).await.unwrap();
            assert_eq!(store.user_count().await, 0);
            store.register("bob", "pass123").await.unwrap();
        }

        let reopened = CredentialStore::open(&data_dir).await.unwrap();
        assert_eq!(reopened.user_count().await, 1);
        assert!(reopened.login("bob", "pass123").await.is_ok());
        assert!(matches!(
            reopened.login("carol", "abc").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_stored_record_has_no_plaintext() {
        let (tmp, store) = open_store().await;
        store.register("alice", "hunter2-secret").await.unwrap();
        let raw = std::fs::read_to_string(tmp.path().join("data/users.dat")).unwrap();
        assert!(!raw.contains("hunter2-secret"));

        let fields: Vec<&str> = raw.trim_end().split(':').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1].len(), 64);
        assert_eq!(fields[2].len(), 32);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_single_winner() {
        let (tmp, store) = open_store().await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.register("race", &format!("pw-{i}")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(AuthError::AlreadyExists) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(ok, 1, "exactly one concurrent registration may win");
        let raw = std::fs::read_to_string(tmp.path().join("data/users.dat")).unwrap();
        assert_eq!(raw.lines().count(), 1);
    }
}
