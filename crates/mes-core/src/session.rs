//! Authenticated session state.
//!
//! A [`Session`] is created at login and holds the bearer token plus the
//! user it belongs to. It is handed around through a [`SessionStore`], an
//! explicitly passed handle: components that need the credential take a
//! clone of the store and read an immutable [`Arc<Session>`] snapshot when
//! they need it. Logging out clears the store; snapshots already taken stay
//! valid until dropped.
//!
//! The store can be persisted to `$XDG_CONFIG_HOME/mes/session.json` so a
//! login survives restarts of the CLI.

use crate::error::SessionError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// The user a session belongs to, as reported by the login endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(alias = "nom")]
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Claims carried in the payload segment of a JWT bearer token.
///
/// The signature is not verified here; that is the server's job. The claims
/// only feed display and expiry checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Claims {
    #[serde(alias = "sub", alias = "_id")]
    pub id: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(alias = "nom")]
    pub name: Option<String>,
    /// Expiry, seconds since the Unix epoch.
    pub exp: Option<i64>,
}

impl Claims {
    /// Decode the payload of a `header.payload.signature` token.
    pub fn decode(token: &str) -> Result<Self, SessionError> {
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(SessionError::MalformedToken(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| SessionError::MalformedToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SessionError::MalformedToken(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: User,
    claims: Option<Claims>,
}

/// On-disk form. Claims are re-derived from the token on load.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    token: String,
    #[serde(default)]
    user: User,
}

impl Session {
    /// Build a session from a token and the user returned alongside it.
    /// Missing user fields are filled from the token claims when the token
    /// is a JWT; opaque tokens are accepted as-is.
    pub fn new(token: impl Into<String>, user: User) -> Self {
        let token = token.into();
        let claims = Claims::decode(&token).ok();
        let mut user = user;
        if let Some(c) = &claims {
            user.name = user.name.or_else(|| c.name.clone());
            user.email = user.email.or_else(|| c.email.clone());
            user.role = user.role.or_else(|| c.role.clone());
        }
        Self { token, user, claims }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Name shown in the header: user name, then email, then a placeholder.
    pub fn display_name(&self) -> &str {
        self.user
            .name
            .as_deref()
            .or(self.user.email.as_deref())
            .unwrap_or("utilisateur")
    }

    /// True when the token carries an `exp` claim that is in the past.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.claims
            .as_ref()
            .and_then(|c| c.exp)
            .is_some_and(|exp| exp <= now.timestamp())
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Shared, explicitly passed holder of the current session.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Arc<Session>>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("logged_in", &self.current().is_some())
            .finish()
    }
}

impl SessionStore {
    /// An empty (logged out) store.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        store.login(session);
        store
    }

    pub fn login(&self, session: Session) {
        tracing::debug!(user = session.display_name(), "session: login");
        self.tx.send_replace(Some(Arc::new(session)));
    }

    pub fn logout(&self) {
        tracing::debug!("session: logout");
        self.tx.send_replace(None);
    }

    /// Immutable snapshot of the current session, if any.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.tx.borrow().clone()
    }

    /// Load a store from a session file. A missing file, or a stored token
    /// whose `exp` claim has passed, yields an empty store.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        Self::load_at(path, Utc::now())
    }

    fn load_at(path: &Path, now: DateTime<Utc>) -> Result<Self, SessionError> {
        let store = Self::new();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let stored: StoredSession = serde_json::from_str(&text)?;
                let session = Session::new(stored.token, stored.user);
                if session.is_expired(now) {
                    tracing::warn!(
                        path = %path.display(),
                        user = session.display_name(),
                        "stored session expired, starting logged out"
                    );
                } else {
                    store.login(session);
                }
                Ok(store)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(store),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the current session to `path`, or remove the file when logged out.
    pub fn persist(&self, path: &Path) -> Result<(), SessionError> {
        match self.current() {
            Some(session) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let stored = StoredSession {
                    token: session.token.clone(),
                    user: session.user.clone(),
                };
                std::fs::write(path, serde_json::to_string_pretty(&stored)?)?;
            }
            None => match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}

/// Default location of the persisted session.
pub fn session_path() -> PathBuf {
    crate::config::config_dir().join("session.json")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
