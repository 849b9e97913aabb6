//! Test builders: ergonomic constructors for records, sessions and tokens.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use mes_core::{Session, User};
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for raw API records.
///
/// # Example
///
/// ```rust
/// let record = RecordBuilder::named("Presse hydraulique")
///     .field("type", "presse")
///     .field("statut", "disponible")
///     .build();
/// ```
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    pub fn named(nom: &str) -> Self {
        Self::new().field("nom", nom)
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// `count` equipment records named `Machine 0`, `Machine 1`, …
pub fn machines(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            RecordBuilder::named(&format!("Machine {i}"))
                .field("type", if i % 2 == 0 { "presse" } else { "tour" })
                .field("numeroSerie", format!("SN-{i:05}"))
                .build()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Session accepted by [`super::fake_mes_api::FakeMesApi`].
pub fn valid_session() -> Session {
    Session::new(
        super::fake_mes_api::TOKEN,
        User {
            name: Some("Camille Planif".to_string()),
            email: Some(super::fake_mes_api::KNOWN_EMAIL.to_string()),
            role: Some("planificateur".to_string()),
        },
    )
}

/// Session the fake API rejects with 401.
pub fn stale_session() -> Session {
    Session::new("expired-token", User::default())
}

/// Unsigned JWT carrying `claims`, for tests that only need decoding.
pub fn jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
