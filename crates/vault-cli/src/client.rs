//! HTTP client for the vaultd API

use reqwest::{Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use vault_core::api::{
    Credentials, ListResponse, LoginResponse, MessageResponse, UploadResponse,
};
use vault_core::{ErrorKind, ObjectMeta, SessionToken};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error envelope
    #[error("{message} (HTTP {status})")]
    Api {
        status: StatusCode,
        kind: Option<ErrorKind>,
        message: String,
    },

    #[error("request to vaultd failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api { kind, .. } => *kind,
            ClientError::Http(_) => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

pub struct VaultClient {
    http: reqwest::Client,
    base_url: String,
}

impl VaultClient {
    pub fn new(server_url: &str, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vault/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn health(&self) -> ClientResult<serde_json::Value> {
        let resp = self.http.get(self.url("/health")).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn register(&self, username: &str, password: &str) -> ClientResult<String> {
        let resp = self
            .http
            .post(self.url("/register"))
            .json(&credentials(username, password))
            .send()
            .await?;
        let body: MessageResponse = check(resp).await?.json().await?;
        Ok(body.message)
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<SessionToken> {
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&credentials(username, password))
            .send()
            .await?;
        let body: LoginResponse = check(resp).await?.json().await?;
        Ok(body.token)
    }

    /// Upload ciphertext. Returns the name the server stored it under.
    pub async fn upload(
        &self,
        token: &SessionToken,
        filename: &str,
        ciphertext: Vec<u8>,
    ) -> ClientResult<String> {
        let resp = self
            .http
            .post(self.url("/upload"))
            .bearer_auth(token.as_str())
            .query(&[("filename", filename)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(ciphertext)
            .send()
            .await?;
        let body: UploadResponse = check(resp).await?.json().await?;
        Ok(body.filename)
    }

    pub async fn download(&self, token: &SessionToken, filename: &str) -> ClientResult<Vec<u8>> {
        let resp = self
            .http
            .get(self.url("/download"))
            .bearer_auth(token.as_str())
            .query(&[("filename", filename)])
            .send()
            .await?;
        Ok(check(resp).await?.bytes().await?.to_vec())
    }

    pub async fn list(&self, token: &SessionToken) -> ClientResult<Vec<ObjectMeta>> {
        let resp = self
            .http
            .get(self.url("/list"))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        let body: ListResponse = check(resp).await?.json().await?;
        Ok(body.files)
    }

    pub async fn logout(&self, token: &SessionToken) -> ClientResult<()> {
        let resp = self
            .http
            .post(self.url("/logout"))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// Turn a non-2xx response into `ClientError::Api`, keeping the server's message.
async fn check(resp: Response) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let (kind, message) = match serde_json::from_str::<MessageResponse>(&text) {
        Ok(envelope) => (envelope.kind, envelope.message),
        Err(_) if text.trim().is_empty() => (None, status.to_string()),
        Err(_) => (None, text.trim().to_string()),
    };
    Err(ClientError::Api {
        status,
        kind,
        message,
    })
}
