#![allow(unused)]
//! Headless subcommands, process-level integration harness.
//!
//! # What this covers
//!
//! This harness exercises `mes` as a compiled binary via
//! [`std::process::Command`], pointed at the fake MES API with `--base-url`.
//! It validates what a script calling `mes` would observe.
//!
//! - **search**: grouped text and JSON output, failed sources reported on
//!   stderr with a clean exit.
//! - **list**: one line per decodable record.
//! - **login / logout**: the session file is written and removed, and later
//!   commands pick it up.
//! - **Exit codes**: bad arguments, unknown kinds and missing sessions are
//!   non-zero.
//!
//! # What this does NOT cover
//!
//! - TUI rendering (that requires a real terminal)
//!
//! # Running
//!
//! ```sh
//! cargo test --test headless_harness
//! ```

mod common;
use common::*;

use pretty_assertions::assert_eq;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `mes` with an isolated config directory and no inherited MES_* settings.
fn mes_binary(config_home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mes"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("MES_TOKEN")
        .env_remove("MES_BASE_URL")
        .env_remove("MES_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

async fn run(config_home: &Path, base_url: &str, args: &[&str]) -> Output {
    let mut cmd = mes_binary(config_home);
    cmd.arg("--base-url").arg(base_url).args(args);
    tokio::task::spawn_blocking(move || cmd.output().expect("failed to run mes"))
        .await
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

async fn setup() -> (FakeMesApi, TempDir) {
    (
        FakeMesApi::seeded().await.unwrap(),
        tempfile::tempdir().unwrap(),
    )
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_prints_grouped_text() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["search", "presse", "--token", fake_mes_api::TOKEN],
    )
    .await;

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "Équipement\n\
         \x20 ⚙ Presse hydraulique — presse · PH-2210 · disponible  [/equipements]\n\
         Opérateurs\n\
         \x20 ☺ Jean Dupont — opérateur presse · jean.dupont@usine.fr  [/operateurs]\n\
         2 résultat(s)\n"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn multi_word_query_is_joined() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["search", "tour", "cnc", "--token", fake_mes_api::TOKEN],
    )
    .await;

    assert!(out.status.success());
    assert!(stdout(&out).contains("Tour CNC"), "{}", stdout(&out));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_json_is_parseable() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["search", "acier", "--json", "--token", fake_mes_api::TOKEN],
    )
    .await;

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["query"], "acier");
    assert_eq!(value["groups"][0]["category"], "Matériaux");
    assert_eq!(value["groups"][0]["results"][0]["display_name"], "Acier S235");
    assert_eq!(value["groups"][0]["results"][0]["raw_record"]["_id"], "mat-1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_source_goes_to_stderr_and_exits_zero() {
    let (api, home) = setup().await;
    api.fail("operateurs").await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["search", "presse", "--token", fake_mes_api::TOKEN],
    )
    .await;

    assert!(out.status.success());
    assert!(stdout(&out).contains("Presse hydraulique"));
    assert!(!stdout(&out).contains("Jean Dupont"));
    assert!(
        stderr(&out).contains("warning: sources unavailable: operator"),
        "stderr: {}",
        stderr(&out)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_without_session_still_matches_pages() {
    let (api, home) = setup().await;
    let out = run(home.path(), &api.base_url(), &["search", "equip"]).await;

    assert!(out.status.success());
    assert!(stdout(&out).contains("Équipements — Aller à /equipements"));
    assert!(stderr(&out).contains("equipment, material, operator, process"));
    assert_eq!(api.total_hits().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_match_reports_empty_set() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["search", "zzz-no-match", "--token", fake_mes_api::TOKEN],
    )
    .await;

    assert!(out.status.success());
    assert_eq!(stdout(&out), "Aucun résultat pour «zzz-no-match»\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_match_echoes_the_query_as_typed() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["search", "Équipe", "zzz", "--token", fake_mes_api::TOKEN],
    )
    .await;

    assert!(out.status.success());
    assert_eq!(stdout(&out), "Aucun résultat pour «Équipe zzz»\n");
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn list_prints_decodable_records() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["list", "materiaux", "--token", fake_mes_api::TOKEN],
    )
    .await;

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{text}");
    assert!(lines[0].starts_with("▤ Acier S235"));
    assert!(lines[1].starts_with("▤ Aluminium 6061"));
    assert_eq!(lines[2], "2 material(s)");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn list_unknown_kind_fails() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["list", "machines", "--token", fake_mes_api::TOKEN],
    )
    .await;

    assert!(!out.status.success());
    assert!(stderr(&out).contains("unknown kind"), "stderr: {}", stderr(&out));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn list_without_session_fails() {
    let (api, home) = setup().await;
    let out = run(home.path(), &api.base_url(), &["list", "processus"]).await;

    assert!(!out.status.success());
    assert!(stderr(&out).contains("not logged in"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn list_with_rejected_token_fails() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["list", "processus", "--token", "expired-token"],
    )
    .await;

    assert!(!out.status.success());
    assert!(stderr(&out).contains("listing process failed"));
}

// ---------------------------------------------------------------------------
// login / logout
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_persists_session_for_later_commands() {
    let (api, home) = setup().await;
    let session_file = home.path().join("mes").join("session.json");

    let out = run(
        home.path(),
        &api.base_url(),
        &[
            "login",
            "--email",
            fake_mes_api::KNOWN_EMAIL,
            "--password",
            fake_mes_api::KNOWN_PASSWORD,
        ],
    )
    .await;
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("Connecté : Camille Planif"));
    assert!(session_file.exists());

    let out = run(home.path(), &api.base_url(), &["search", "presse"]).await;
    assert!(stdout(&out).contains("Presse hydraulique"));
    assert!(!stderr(&out).contains("sources unavailable"), "stderr: {}", stderr(&out));

    let out = run(home.path(), &api.base_url(), &["logout"]).await;
    assert!(out.status.success());
    assert!(!session_file.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_stored_session_is_ignored() {
    let (api, home) = setup().await;
    let session_file = home.path().join("mes").join("session.json");
    std::fs::create_dir_all(session_file.parent().unwrap()).unwrap();
    let token = jwt(serde_json::json!({"name": "Ancien", "exp": 1_000_000_000}));
    std::fs::write(
        &session_file,
        serde_json::json!({"token": token, "user": {}}).to_string(),
    )
    .unwrap();

    let out = run(home.path(), &api.base_url(), &["search", "presse"]).await;
    assert!(out.status.success());
    assert!(stderr(&out).contains("stored session expired"), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("sources unavailable"), "stderr: {}", stderr(&out));
    assert_eq!(api.total_hits().await, 0);

    let out = run(home.path(), &api.base_url(), &["list", "equipements"]).await;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("not logged in"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_token_flag_is_warned_about() {
    let (api, home) = setup().await;
    let token = jwt(serde_json::json!({"exp": 1_000_000_000}));
    let out = run(
        home.path(),
        &api.base_url(),
        &["list", "equipements", "--token", &token],
    )
    .await;

    assert!(!out.status.success());
    assert!(stderr(&out).contains("--token is expired"), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("listing equipment failed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_with_wrong_password_fails() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &["login", "--email", fake_mes_api::KNOWN_EMAIL, "--password", "nope"],
    )
    .await;

    assert!(!out.status.success());
    assert!(stderr(&out).contains("Identifiants invalides"));
    assert!(!home.path().join("mes").join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn register_stores_new_account() {
    let (api, home) = setup().await;
    let out = run(
        home.path(),
        &api.base_url(),
        &[
            "register",
            "--name",
            "Nadia Ferhat",
            "--email",
            "nadia@usine.fr",
            "--password",
            "s3cret",
        ],
    )
    .await;

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let stored = std::fs::read_to_string(home.path().join("mes").join("session.json")).unwrap();
    assert!(stored.contains("planificateur"), "{stored}");
}

// ---------------------------------------------------------------------------
// Argument errors
// ---------------------------------------------------------------------------

#[test]
fn search_requires_a_query() {
    let home = tempfile::tempdir().unwrap();
    let out = mes_binary(home.path()).arg("search").output().unwrap();
    assert!(!out.status.success());
}

#[test]
fn invalid_base_url_fails() {
    let home = tempfile::tempdir().unwrap();
    let out = mes_binary(home.path())
        .args(["--base-url", "ftp://nowhere", "search", "x"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid API base URL"));
}
