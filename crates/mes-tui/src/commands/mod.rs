// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

use crate::theme::Theme;
use mes_core::catalog::{self, NavigablePage};

/// A parsed, validated command ready to be executed by the app shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    /// Switch to a known theme.
    Theme(String),
    /// Open a page by path, slug or name.
    Go(&'static NavigablePage),
    /// Refetch the current page.
    Reload,
    /// Forget the stored session.
    Logout,
}

impl Command {
    /// Parse the text after the `:` prefix.
    ///
    /// An empty string returns `Err("")` as a sentinel meaning "close without
    /// acting".
    pub fn parse(input: &str) -> Result<Command, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(String::new());
        }

        let (word, rest) = input
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((input, ""));

        match word {
            "q" | "quit" => Ok(Command::Quit),
            "help" => Ok(Command::Help),
            "reload" | "r" => Ok(Command::Reload),
            "logout" => Ok(Command::Logout),
            "theme" => {
                if rest.is_empty() {
                    Err("usage: theme <default|gruvbox>".to_string())
                } else if Theme::by_name(rest).is_none() {
                    Err(format!("thème inconnu : {rest}"))
                } else {
                    Ok(Command::Theme(rest.to_string()))
                }
            }
            "go" => {
                if rest.is_empty() {
                    return Err("usage: go <page>".to_string());
                }
                catalog::resolve(rest)
                    .map(Command::Go)
                    .ok_or_else(|| format!("page inconnue : {rest}"))
            }
            other => Err(format!("commande inconnue : {other}")),
        }
    }
}
