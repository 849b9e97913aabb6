//! mes-core — domain layer of the MES client.
//!
//! This crate holds everything that does not touch a terminal or a socket:
//! the resource record schemas, the static page catalog, the session store
//! and the federated search pipeline.
//!
//! # Architecture
//!
//! ```text
//!            ┌──► catalog (pages) ───────────────┐
//! query ──► search ──► ResourceSource (×4) ──► records ──► ResultSet ──► UI
//!              ▲
//!         SessionStore
//! ```
//!
//! Remote access is abstracted behind [`search::ResourceSource`]; the HTTP
//! implementation lives in `mes-api`.

pub mod catalog;
pub mod config;
pub mod error;
pub mod matching;
pub mod records;
pub mod search;
pub mod session;
pub mod types;

pub use error::{SessionError, SourceError};
pub use search::{search_once, ResourceSource, SearchAggregator, SearchState};
pub use session::{Session, SessionStore, User};
pub use types::{Navigation, ResourceKind, ResultGroup, ResultKind, ResultSet, SearchResult};
