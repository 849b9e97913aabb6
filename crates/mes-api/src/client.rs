//! HTTP/1 client for the MES REST API.
//!
//! One [`MesClient`] is shared by the TUI, the headless commands and the
//! search aggregator. It owns a pooled hyper-util client, so cloning it is
//! cheap and clones share connections.

use crate::error::ApiError;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{header, Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use mes_core::search::ResourceSource;
use mes_core::{ResourceKind, Session, SourceError, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest server message kept in an error.
const MAX_MESSAGE_LEN: usize = 200;

#[derive(Clone)]
pub struct MesClient {
    http: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
}

impl std::fmt::Debug for MesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MesClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    #[serde(rename = "motDePasse")]
    mot_de_passe: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    nom: &'a str,
    email: &'a str,
    #[serde(rename = "motDePasse")]
    mot_de_passe: &'a str,
    role: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(default)]
    user: User,
}

impl MesClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`. Only
    /// plain `http` is supported.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let uri: Uri = base_url
            .parse()
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        match (uri.scheme_str(), uri.host()) {
            (Some("http"), Some(_)) => {}
            _ => {
                return Err(ApiError::InvalidUrl(format!(
                    "{base_url}: expected http://host[:port]"
                )))
            }
        }

        let http = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/<kind>`: every record of one kind, undecoded.
    pub async fn list(&self, kind: ResourceKind, session: &Session) -> Result<Vec<Value>, ApiError> {
        let (status, body) = self
            .send(Method::GET, &format!("/api/{}", kind.endpoint()), Some(session), None)
            .await?;

        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ApiError::Unauthorized(status.as_u16()))
            }
            _ => {
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message: server_message(&body),
                })
            }
        }

        match serde_json::from_slice::<Value>(&body)? {
            Value::Array(records) => {
                tracing::debug!(%kind, count = records.len(), "api: listed");
                Ok(records)
            }
            other => Err(ApiError::Decode(format!(
                "expected a JSON array from /api/{}, got {}",
                kind.endpoint(),
                json_type(&other)
            ))),
        }
    }

    /// `POST /api/auth/login`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let body = serde_json::to_vec(&LoginBody {
            email,
            mot_de_passe: password,
        })?;
        self.authenticate("/api/auth/login", body).await
    }

    /// `POST /api/auth/register`. The server answers with a token for the
    /// new account, so registration also logs in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<Session, ApiError> {
        let body = serde_json::to_vec(&RegisterBody {
            nom: name,
            email,
            mot_de_passe: password,
            role,
        })?;
        self.authenticate("/api/auth/register", body).await
    }

    async fn authenticate(&self, path: &str, body: Vec<u8>) -> Result<Session, ApiError> {
        let (status, body) = self.send(Method::POST, path, None, Some(body)).await?;
        if !status.is_success() {
            tracing::debug!(path, status = status.as_u16(), "api: authentication refused");
            return Err(ApiError::Rejected(server_message(&body)));
        }
        let auth: AuthResponse = serde_json::from_slice(&body)?;
        Ok(Session::new(auth.token, auth.user))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        json: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Bytes), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(&url)
            .header(header::ACCEPT, "application/json");
        if let Some(session) = session {
            builder = builder.header(header::AUTHORIZATION, session.bearer());
        }
        let body = match json {
            Some(bytes) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(bytes))
            }
            None => Full::new(Bytes::new()),
        };
        let request = builder
            .body(body)
            .map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;

        let exchange = async {
            let response = self.http.request(request).await?;
            let status = response.status();
            let bytes = response.into_body().collect().await?.to_bytes();
            Ok::<_, ApiError>((status, bytes))
        };

        let (status, bytes) = tokio::time::timeout(REQUEST_TIMEOUT, exchange)
            .await
            .map_err(|_| ApiError::Transport(format!("{method} {url} timed out")))??;
        tracing::debug!(%method, %url, status = status.as_u16(), bytes = bytes.len(), "api: response");
        Ok((status, bytes))
    }
}

impl ResourceSource for MesClient {
    fn fetch<'a>(
        &'a self,
        kind: ResourceKind,
        session: &'a Session,
    ) -> BoxFuture<'a, Result<Vec<Value>, SourceError>> {
        Box::pin(async move { self.list(kind, session).await.map_err(SourceError::from) })
    }
}

/// The `message` field of a JSON error body, else the body text itself.
fn server_message(body: &[u8]) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        if let Some(Value::String(message)) = map.get("message") {
            return message.clone();
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    text.chars().take(MAX_MESSAGE_LEN).collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
