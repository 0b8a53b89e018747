//! Request and response bodies exchanged between `vault` and `vaultd`.
//!
//! Every response is a JSON envelope carrying `success` and a
//! human-readable `message`; failures add the error `kind`.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::types::{ObjectMeta, SessionToken};

/// Body of `POST /register` and `POST /login`
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Generic envelope for operations that return nothing but a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            kind: None,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            kind: Some(kind),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: SessionToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    /// Canonical name the object was stored under
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub success: bool,
    pub files: Vec<ObjectMeta>,
    pub count: usize,
}

/// Query string of `/upload` and `/download`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_missing_fields_default_empty() {
        let creds: Credentials = serde_json::from_str("{}").unwrap();
        assert!(creds.username.is_empty());
        assert!(creds.password.is_empty());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            username: "alice".into(),
            password: "pass123".into(),
        };
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("alice"));
        assert!(!dbg.contains("pass123"));
    }

    #[test]
    fn test_error_envelope_carries_kind() {
        let body = MessageResponse::error(ErrorKind::AlreadyExists, "username already exists");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "already_exists");

        let ok = serde_json::to_value(MessageResponse::ok("done")).unwrap();
        assert!(ok.get("kind").is_none());
    }
}
