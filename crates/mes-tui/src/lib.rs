//! MES TUI — ratatui application shell.
//!
//! Header, sidebar navigation, a page view listing records, and the federated
//! search bar with its grouped results overlay.

pub mod app;
pub mod commands;
pub mod event;
pub mod theme;
pub mod widgets;

pub use app::App;

use mes_api::MesClient;
use mes_core::{config::Config, session, SessionStore};

/// Run the TUI until the user quits.
///
/// Builds the tokio runtime that carries search cycles and page fetches; the
/// terminal event loop itself stays on the calling thread.
pub fn run(config: Config, sessions: SessionStore, client: MesClient) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("mes-io")
        .enable_all()
        .build()?;

    let theme = theme::Theme::by_name(&config.ui.theme).unwrap_or_else(|| {
        tracing::warn!(theme = %config.ui.theme, "unknown theme, using default");
        theme::Theme::load_default()
    });

    tracing::info!(base_url = client.base_url(), "starting TUI");
    App::new(config, theme, sessions, client, runtime.handle().clone())
        .with_session_file(session::session_path())
        .run()
}
