//! Fake MES REST API for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves:
//! - `GET /api/{kind}`: the configured records of one collection, behind a
//!   bearer token
//! - `POST /api/auth/login` and `POST /api/auth/register`
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn demo() {
//! use common::fake_mes_api::FakeMesApi;
//!
//! let api = FakeMesApi::start().await.unwrap();
//! api.set_records("equipements", common::fixtures::equipements()).await;
//! api.fail("operateurs").await;
//!
//! let client = mes_api::MesClient::new(&api.base_url()).unwrap();
//! # }
//! ```

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Token handed out by the auth endpoints and required by listings.
pub const TOKEN: &str = "test-token";

pub const KNOWN_EMAIL: &str = "planif@usine.fr";
pub const KNOWN_PASSWORD: &str = "secret";

struct Account {
    password: String,
    name: String,
    role: String,
}

/// State shared between the router and test code.
struct ApiState {
    records: HashMap<String, Vec<Value>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    accounts: HashMap<String, Account>,
    /// Listing requests received per collection, authorised or not.
    hits: HashMap<String, usize>,
}

impl Default for ApiState {
    fn default() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(
            KNOWN_EMAIL.to_string(),
            Account {
                password: KNOWN_PASSWORD.to_string(),
                name: "Camille Planif".to_string(),
                role: "planificateur".to_string(),
            },
        );
        Self {
            records: HashMap::new(),
            failing: HashSet::new(),
            delays: HashMap::new(),
            accounts,
            hits: HashMap::new(),
        }
    }
}

type Shared = Arc<Mutex<ApiState>>;

/// Handle to the running fake MES API.
pub struct FakeMesApi {
    addr: SocketAddr,
    state: Shared,
}

impl FakeMesApi {
    /// Start the server on a random port. Every collection starts empty.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state: Shared = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/{kind}", get(list))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Start with every fixture collection loaded.
    pub async fn seeded() -> std::io::Result<Self> {
        let api = Self::start().await?;
        api.set_records("equipements", super::fixtures::equipements()).await;
        api.set_records("materiaux", super::fixtures::materiaux()).await;
        api.set_records("operateurs", super::fixtures::operateurs()).await;
        api.set_records("processus", super::fixtures::processus()).await;
        Ok(api)
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn set_records(&self, endpoint: &str, records: Vec<Value>) {
        self.state
            .lock()
            .await
            .records
            .insert(endpoint.to_string(), records);
    }

    /// Make one collection answer 500 from now on.
    pub async fn fail(&self, endpoint: &str) {
        self.state.lock().await.failing.insert(endpoint.to_string());
    }

    /// Delay every response of one collection.
    pub async fn delay(&self, endpoint: &str, delay: Duration) {
        self.state
            .lock()
            .await
            .delays
            .insert(endpoint.to_string(), delay);
    }

    pub async fn hits(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .await
            .hits
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub async fn total_hits(&self) -> usize {
        self.state.lock().await.hits.values().sum()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn list(
    Path(kind): Path<String>,
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Response {
    let (outcome, delay) = {
        let mut state = state.lock().await;
        *state.hits.entry(kind.clone()).or_default() += 1;

        let expected = format!("Bearer {TOKEN}");
        let authorised = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected);

        let outcome = if !authorised {
            message(StatusCode::UNAUTHORIZED, "Token manquant ou invalide")
        } else if state.failing.contains(&kind) {
            message(StatusCode::INTERNAL_SERVER_ERROR, "Erreur serveur")
        } else {
            match state.records.get(&kind) {
                Some(records) => Json(Value::Array(records.clone())).into_response(),
                None => message(StatusCode::NOT_FOUND, "Ressource inconnue"),
            }
        };
        (outcome, state.delays.get(&kind).copied())
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    outcome
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["motDePasse"].as_str().unwrap_or_default();

    let state = state.lock().await;
    match state.accounts.get(email) {
        Some(account) if account.password == password => Json(json!({
            "token": TOKEN,
            "user": { "nom": account.name, "email": email, "role": account.role },
        }))
        .into_response(),
        _ => message(StatusCode::UNAUTHORIZED, "Identifiants invalides"),
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let field = |key: &str| body[key].as_str().unwrap_or_default().to_string();
    let (name, email, password, role) = (field("nom"), field("email"), field("motDePasse"), field("role"));

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Champs obligatoires manquants");
    }

    let mut state = state.lock().await;
    if state.accounts.contains_key(&email) {
        return message(StatusCode::CONFLICT, "Email déjà utilisé");
    }
    state.accounts.insert(
        email.clone(),
        Account {
            password,
            name: name.clone(),
            role: role.clone(),
        },
    );
    (
        StatusCode::CREATED,
        Json(json!({
            "token": TOKEN,
            "user": { "nom": name, "email": email, "role": role },
        })),
    )
        .into_response()
}
