//! mes — terminal console for a manufacturing execution system.
//!
//! The binary has two faces: an interactive TUI (`mes` / `mes ui`) built on
//! [`mes_tui`], and headless subcommands (`login`, `search`, `list`, …) for
//! scripts. Both drive the same federated search in [`mes_core`] against the
//! REST API reached through [`mes_api`].
//!
//! # Architecture
//!
//! ```text
//! mes-api (HTTP) ──► mes-core (search, sessions) ──► mes-tui (UI)
//!                                   │
//!                                   └──► headless (stdout)
//! ```

pub mod headless;

pub use mes_api::{ApiError, MesClient};
pub use mes_core::{search_once, ResultSet, Session, SessionStore};
