use anyhow::Context;
use clap::{Parser, Subcommand};
use mes::headless::{self, Format};
use mes_api::MesClient;
use mes_core::config::Config;
use mes_core::session::{self, Session, SessionStore, User};
use mes_core::types::ResourceKind;
use std::io::Write;
use std::path::Path;

#[derive(Parser)]
#[command(name = "mes", version, about = "MES console — terminal client for a manufacturing execution system")]
struct Cli {
    /// Write debug logs to /tmp/mes-debug.log (tail -f to inspect). Headless
    /// subcommands log to stderr instead.
    #[arg(long, global = true)]
    debug: bool,

    /// Server root, e.g. http://localhost:5000. Overrides `api.base_url`.
    #[arg(long, global = true, env = "MES_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Open the interactive console (the default).
    Ui,
    /// Log in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MES_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and store the resulting session.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "MES_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "planificateur")]
        role: String,
    },
    /// Forget the stored session.
    Logout,
    /// Run one federated search and print the grouped results.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Print the result set as JSON.
        #[arg(long)]
        json: bool,
        /// Bearer token to use instead of the stored session.
        #[arg(long, env = "MES_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// List every record of one kind (equipements, materiaux, operateurs, processus).
    List {
        kind: String,
        #[arg(long, env = "MES_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Cmd::Ui);

    match command {
        Cmd::Ui => init_file_logging(cli.debug)?,
        _ => init_stderr_logging(cli.debug),
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable, using defaults");
        Config::defaults()
    });
    if let Some(url) = cli.base_url {
        config.api.base_url = url;
    }
    let client = MesClient::new(&config.api.base_url)
        .with_context(|| format!("invalid API base URL {:?}", config.api.base_url))?;
    let session_file = session::session_path();

    match command {
        Cmd::Ui => {
            let sessions = load_sessions(&session_file);
            mes_tui::run(config, sessions, client)
        }
        Cmd::Login { email, password } => {
            let session = block_on(client.login(&email, &password))?
                .context("login failed")?;
            store(&session_file, session)
        }
        Cmd::Register {
            name,
            email,
            password,
            role,
        } => {
            let session = block_on(client.register(&name, &email, &password, &role))?
                .context("registration failed")?;
            store(&session_file, session)
        }
        Cmd::Logout => {
            SessionStore::new().persist(&session_file)?;
            eprintln!("Déconnecté");
            Ok(())
        }
        Cmd::Search { query, json, token } => {
            let session = resolve_session(token, &session_file);
            let query = query.join(" ");
            let set = block_on(async {
                mes_core::search_once(&query, &client, session.as_ref()).await
            })?;

            if let Some(notice) = headless::failed_sources_notice(&set) {
                eprintln!("{notice}");
            }
            let format = if json { Format::Json } else { Format::Text };
            print(&headless::render(&set, format, &query)?)
        }
        Cmd::List { kind, token } => {
            let kind = ResourceKind::parse(&kind).with_context(|| {
                format!("unknown kind {kind:?}, expected one of equipements, materiaux, operateurs, processus")
            })?;
            let session = resolve_session(token, &session_file)
                .context("not logged in: run `mes login` or pass --token")?;
            let raw = block_on(client.list(kind, &session))?
                .with_context(|| format!("listing {kind} failed"))?;
            print(&headless::render_records(kind, raw))
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_file_logging(debug: bool) -> anyhow::Result<()> {
    if !debug {
        return Ok(());
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("/tmp/mes-debug.log")?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();
    tracing::info!("mes debug log started — tail -f /tmp/mes-debug.log");
    Ok(())
}

fn init_stderr_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn block_on<F: std::future::Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

fn load_sessions(path: &Path) -> SessionStore {
    SessionStore::load(path).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "stored session unreadable, starting logged out");
        SessionStore::new()
    })
}

/// `--token` wins over the stored session. An expired `--token` is still
/// sent, the server has the final word; expired stored sessions are skipped
/// by [`SessionStore::load`].
fn resolve_session(token: Option<String>, path: &Path) -> Option<Session> {
    match token {
        Some(token) => {
            let session = Session::new(token, User::default());
            if session.is_expired(chrono::Utc::now()) {
                tracing::warn!("--token is expired, the server will likely reject it");
            }
            Some(session)
        }
        None => load_sessions(path).current().map(|s| (*s).clone()),
    }
}

fn store(path: &Path, session: Session) -> anyhow::Result<()> {
    let name = session.display_name().to_string();
    SessionStore::with_session(session).persist(path)?;
    eprintln!("Connecté : {name}");
    Ok(())
}

fn print(text: &str) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}
