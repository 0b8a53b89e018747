//! Append-only user registry.
//!
//! One record per line, `username:password_hash:salt`. Records are never
//! rewritten or removed; registering appends a line. Every record ends with
//! a newline, so a final line without one is the remains of an interrupted
//! write and is ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::warn;

use crate::error::AuthResult;

const REGISTRY_FILE: &str = "users.dat";

/// A registered user. The plaintext password is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    /// Hex SHA-256 of `salt || password`
    pub password_hash: String,
    /// Hex-encoded 16-byte salt
    pub salt: String,
}

impl User {
    fn to_record(&self) -> String {
        format!("{}:{}:{}\n", self.username, self.password_hash, self.salt)
    }

    fn parse_record(line: &str) -> Option<Self> {
        let mut parts = line.splitn(3, ':');
        let username = parts.next()?;
        let password_hash = parts.next()?;
        let salt = parts.next()?.trim_end_matches('\r');
        if username.is_empty() || password_hash.is_empty() || salt.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            salt: salt.to_string(),
        })
    }
}

/// Handle on the registry file inside the auth data directory
#[derive(Debug, Clone)]
pub struct UserRegistry {
    path: PathBuf,
}

impl UserRegistry {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(REGISTRY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing file is an empty registry (first run).
    ///
    /// Malformed lines are skipped. If a username appears twice the first
    /// record wins, since users are immutable once registered.
    pub async fn load(&self) -> AuthResult<HashMap<String, User>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        let complete = complete_len(content.as_bytes());
        if complete < content.len() {
            warn!(
                path = %self.path.display(),
                bytes = content.len() - complete,
                "ignoring unterminated trailing user record"
            );
        }

        let mut users = HashMap::new();
        for (lineno, line) in content[..complete].lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match User::parse_record(line) {
                Some(user) => {
                    if users.contains_key(&user.username) {
                        warn!(
                            line = lineno + 1,
                            username = %user.username,
                            "duplicate user record ignored"
                        );
                        continue;
                    }
                    users.insert(user.username.clone(), user);
                }
                None => warn!(
                    path = %self.path.display(),
                    line = lineno + 1,
                    "skipping malformed user record"
                ),
            }
        }
        Ok(users)
    }

    /// Append one record and flush it to disk before returning.
    ///
    /// An unterminated tail left by an earlier interrupted write is cut off
    /// first so the new record starts on its own line. If writing fails the
    /// file is truncated back, leaving no partial record behind.
    pub async fn append(&self, user: &User) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        let mut existing = Vec::new();
        file.read_to_end(&mut existing).await?;
        let keep = complete_len(&existing) as u64;
        if keep < existing.len() as u64 {
            warn!(
                path = %self.path.display(),
                bytes = existing.len() as u64 - keep,
                "discarding unterminated trailing user record"
            );
        }

        if let Err(e) = write_at(&mut file, keep, user.to_record().as_bytes()).await {
            if let Err(rollback) = file.set_len(keep).await {
                warn!(path = %self.path.display(), "failed to roll back user registry: {rollback}");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// Length of the prefix made of newline-terminated lines.
fn complete_len(content: &[u8]) -> usize {
    content
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1)
}

/// Replace everything from `offset` on with `record` and sync it.
async fn write_at(file: &mut tokio::fs::File, offset: u64, record: &[u8]) -> std::io::Result<()> {
    file.set_len(offset).await?;
    file.seek(std::io::SeekFrom::Start(offset)).await?;
    file.write_all(record).await?;
    file.flush().await?;
    file.sync_data().await
}
