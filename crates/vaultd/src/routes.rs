//! HTTP binding of the vault protocol
//!
//! ```text
//! POST /register              {"username","password"}
//! POST /login                 {"username","password"} -> {"token"}
//! POST /upload?filename=NAME  raw ciphertext body       (Bearer)
//! GET  /download?filename=NAME                          (Bearer)
//! GET  /list                                            (Bearer)
//! POST /logout                                          (Bearer)
//! GET  /health
//! ```

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::error;
use vault_core::api::{
    Credentials, FileQuery, ListResponse, LoginResponse, MessageResponse, UploadResponse,
};
use vault_core::{ErrorKind, SessionToken, VaultError, VaultResult};

use crate::metrics::ApiMetrics;
use crate::protocol::VaultService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VaultService>,
    pub metrics: ApiMetrics,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download", get(download))
        .route("/list", get(list))
        .route("/logout", post(logout))
        .route("/health", get(health))
        .with_state(state)
}

/// A protocol failure rendered as a JSON error envelope
pub struct ApiError(VaultError);

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        Self(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation
        | ErrorKind::InputTooShort
        | ErrorKind::AuthenticationOrCorruption => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidCredentials | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::Io | ErrorKind::RandomSource => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Server-side detail (paths, OS errors) stays in the log
            error!(kind = %kind, "request failed: {}", self.0);
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(MessageResponse::error(kind, message))).into_response()
    }
}

/// Token from `Authorization: Bearer <token>`; empty when absent or malformed.
fn bearer_token(headers: &HeaderMap) -> SessionToken {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or("");
    SessionToken::new(token)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> VaultResult<T> {
    body.map(|Json(inner)| inner)
        .map_err(|e| VaultError::validation(format!("invalid request: {}", e.body_text())))
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = match json_body(body) {
        Ok(creds) => state.service.register(&creds.username, &creds.password).await,
        Err(e) => Err(e),
    };
    state.metrics.observe("register", &result);
    result?;
    Ok(Json(MessageResponse::ok("user registered successfully")))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let result = match json_body(body) {
        Ok(creds) => state.service.login(&creds.username, &creds.password).await,
        Err(e) => Err(e),
    };
    state.metrics.observe("login", &result);
    let token = result?;
    state
        .metrics
        .set_sessions(state.service.credentials().session_count().await);
    Ok(Json(LoginResponse {
        success: true,
        message: "login successful".into(),
        token,
    }))
}

async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FileQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let token = bearer_token(&headers);
    let result = state.service.upload(&token, &query.filename, &body).await;
    state.metrics.observe("upload", &result);
    let filename = result?;
    state.metrics.uploaded(body.len());
    Ok(Json(UploadResponse {
        success: true,
        message: "file uploaded successfully".into(),
        filename,
    }))
}

async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FileQuery>,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers);
    let result = state.service.download(&token, &query.filename).await;
    state.metrics.observe("download", &result);
    let bytes = result?;
    state.metrics.downloaded(bytes.len());

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, content_disposition(&query.filename)),
        ],
        bytes,
    )
        .into_response())
}

/// `attachment; filename="<canonical name>"`, or a bare `attachment` when the
/// name cannot be carried in a header value.
fn content_disposition(logical_name: &str) -> HeaderValue {
    let name = vault_core::canonical_name(logical_name).replace(['"', '\\'], "_");
    HeaderValue::try_from(format!("attachment; filename=\"{name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListResponse>, ApiError> {
    let token = bearer_token(&headers);
    let result = state.service.list(&token).await;
    state.metrics.observe("list", &result);
    let files = result?;
    Ok(Json(ListResponse {
        success: true,
        count: files.len(),
        files,
    }))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<MessageResponse> {
    state.service.logout(&bearer_token(&headers)).await;
    state.metrics.observe("logout", &Ok::<(), VaultError>(()));
    state
        .metrics
        .set_sessions(state.service.credentials().session_count().await);
    Json(MessageResponse::ok("logged out"))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let storage_ok = vault_storage::health::is_healthy(state.service.blobs()).await;
    let status = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(serde_json::json!({
            "success": storage_ok,
            "status": if storage_ok { "running" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use prometheus_client::registry::Registry;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn app() -> (TempDir, Router, ApiMetrics) {
        let (tmp, service) = crate::protocol::tests::service().await;
        let metrics = ApiMetrics::new(&mut Registry::default());
        let state = AppState {
            service: Arc::new(service),
            metrics: metrics.clone(),
        };
        (tmp, router(state, 1024), metrics)
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn login_as(app: &Router, user: &str, pass: &str) -> String {
        let creds = serde_json::json!({"username": user, "password": pass});
        let (status, _) = send_json(app, json_request("/register", creds.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send_json(app, json_request("/login", creds)).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    fn authed(method: &str, uri: &str, token: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_session_over_http() {
        let (_tmp, app, metrics) = app().await;
        let token = login_as(&app, "alice", "pass123").await;
        assert_eq!(token.len(), 64);

        let blob = vault_crypto::encrypt(b"hello", "pass123").unwrap();
        let (status, body) = send_json(
            &app,
            authed("POST", "/upload?filename=notes.txt", &token, Body::from(blob.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "notes.txt.enc");

        let (status, body) = send_json(&app, authed("GET", "/list", &token, Body::empty())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["files"][0]["filename"], "notes.txt.enc");
        assert_eq!(body["files"][0]["size"], blob.len());
        assert!(body["files"][0]["uploaded_at"].is_string());

        let (status, bytes) = send(
            &app,
            authed("GET", "/download?filename=notes.txt", &token, Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, blob);
        assert_eq!(vault_crypto::decrypt(&bytes, "pass123").unwrap(), b"hello");

        let (status, _) = send_json(&app, authed("POST", "/logout", &token, Body::empty())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(&app, authed("GET", "/list", &token, Body::empty())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "unauthorized");

        assert_eq!(metrics.request_count("upload", "ok"), 1);
        assert_eq!(metrics.request_count("list", "unauthorized"), 1);
    }

    #[tokio::test]
    async fn test_status_codes() {
        let (_tmp, app, _metrics) = app().await;
        let token = login_as(&app, "alice", "pass123").await;

        // duplicate registration
        let creds = serde_json::json!({"username": "alice", "password": "other"});
        let (status, body) = send_json(&app, json_request("/register", creds)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "already_exists");

        // short username
        let creds = serde_json::json!({"username": "al", "password": "pass123"});
        let (status, _) = send_json(&app, json_request("/register", creds)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // wrong password
        let creds = serde_json::json!({"username": "alice", "password": "nope"});
        let (status, body) = send_json(&app, json_request("/login", creds)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "invalid_credentials");

        // missing object
        let (status, body) = send_json(
            &app,
            authed("GET", "/download?filename=ghost", &token, Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        // missing filename parameter
        let (status, _) = send_json(&app, authed("POST", "/upload", &token, Body::from("x"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_control_characters_in_filename_rejected() {
        let (tmp, app, metrics) = app().await;
        let token = login_as(&app, "alice", "pass123").await;

        for name in ["a%0Ab", "a%0D%0AX-Injected:%201", "bell%07"] {
            let (status, body) = send_json(
                &app,
                authed("POST", &format!("/upload?filename={name}"), &token, Body::from("x")),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{name}");
            assert_eq!(body["kind"], "validation");
        }
        assert_eq!(metrics.request_count("upload", "ok"), 0);
        assert!(!tmp.path().join("storage/alice").exists());
    }

    #[tokio::test]
    async fn test_download_disposition_header() {
        let (_tmp, app, _metrics) = app().await;
        let token = login_as(&app, "alice", "pass123").await;

        // "résumé \"v2\".txt", percent-encoded
        let name = "r%C3%A9sum%C3%A9%20%22v2%22.txt";
        let (status, _) = send_json(
            &app,
            authed("POST", &format!("/upload?filename={name}"), &token, Body::from("x")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(authed(
                "GET",
                &format!("/download?filename={name}"),
                &token,
                Body::empty(),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].as_bytes();
        assert_eq!(
            disposition,
            "attachment; filename=\"résumé _v2_.txt.enc\"".as_bytes()
        );
    }

    #[test]
    fn test_content_disposition_falls_back() {
        assert_eq!(
            content_disposition("notes.txt"),
            HeaderValue::from_static("attachment; filename=\"notes.txt.enc\"")
        );
        assert_eq!(
            content_disposition("bad\nname"),
            HeaderValue::from_static("attachment")
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let (_tmp, app, _metrics) = app().await;
        let req = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn test_requests_without_bearer_are_unauthorized() {
        let (_tmp, app, _metrics) = app().await;
        let req = Request::post("/upload?filename=a.txt")
            .body(Body::from("data"))
            .unwrap();
        let (status, _) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = Request::get("/list")
            .header(header::AUTHORIZATION, "Basic YWxpY2U6cGFzcw==")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_without_token_succeeds() {
        let (_tmp, app, _metrics) = app().await;
        let req = Request::post("/logout").body(Body::empty()).unwrap();
        let (status, body) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_upload_over_limit_rejected() {
        let (_tmp, app, _metrics) = app().await;
        let token = login_as(&app, "alice", "pass123").await;
        let (status, _) = send(
            &app,
            authed("POST", "/upload?filename=big", &token, Body::from(vec![0u8; 4096])),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_health() {
        let (_tmp, app, _metrics) = app().await;
        let (status, body) = send_json(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = VaultError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "/srv/vault/storage/alice: disk full",
        ));
        let resp = ApiError(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
