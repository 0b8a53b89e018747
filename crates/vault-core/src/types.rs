use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque bearer token identifying one login session.
///
/// `Debug` only shows a short prefix so tokens never end up in logs whole.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionToken({prefix}…)")
    }
}

/// Metadata for one stored object, as reported by `list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Canonical on-disk name (always carries the `.enc` suffix)
    #[serde(rename = "filename")]
    pub logical_name: String,
    /// Stored (ciphertext) size in bytes
    pub size: u64,
    #[serde(rename = "uploaded_at")]
    pub last_modified: DateTime<Utc>,
}
