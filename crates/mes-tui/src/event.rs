//! Semantic application events: crossterm key events mapped to a
//! widget-agnostic vocabulary so widgets never touch crossterm directly.
//!
//! # Keybindings
//!
//! | Key(s)                  | Event                      |
//! |-------------------------|----------------------------|
//! | `q`, `Ctrl+c`           | `Quit`                     |
//! | `Tab` (rebindable)      | `FocusNext`                |
//! | `/` (rebindable)        | `SearchFocus`              |
//! | `?` (rebindable)        | `Help`                     |
//! | `:` (rebindable)        | `CommandMode`              |
//! | `r`                     | `Reload`                   |
//! | `PageUp`, `Ctrl+u`      | `ScrollUp`                 |
//! | `PageDown`, `Ctrl+d`    | `ScrollDown`               |
//! | `↑` / `k`               | `Nav(Up)`                  |
//! | `↓` / `j`               | `Nav(Down)`                |
//! | `←` / `h`               | `Nav(Left)`                |
//! | `→` / `l`               | `Nav(Right)`               |
//! | printable char          | `Char(c)`                  |
//! | `Backspace`             | `Backspace`                |
//! | `Enter`                 | `Enter`                    |
//! | `Esc`                   | `Escape`                   |
//! | terminal resize         | `Resize(w, h)`             |
//!
//! The four rebindable keys come from the `[keybindings]` section of
//! `config.toml` and are resolved once into a [`Keymap`]. Values are a single
//! character, `Tab`, `BackTab`, `Space` or `F1`..`F12`.
//!
//! ## Insert mode
//!
//! When the search bar or the command bar is focused, the event loop calls
//! [`Keymap::to_app_event_insert`] instead. Letters that are shortcuts in normal mode
//! type themselves, arrow keys still navigate (cursor movement and result
//! highlight), and `Ctrl+u` clears the input.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use mes_core::config::KeybindingsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A semantic application event derived from a raw crossterm [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Quit,
    /// Move keyboard focus to the next pane.
    FocusNext,
    /// Jump to the search bar.
    SearchFocus,
    /// Toggle the help popup.
    Help,
    /// Open the command bar.
    CommandMode,
    /// Refetch the records of the current page.
    Reload,
    ScrollUp,
    ScrollDown,
    Nav(Direction),
    Char(char),
    Backspace,
    /// Empty the focused text input.
    ClearInput,
    Enter,
    Escape,
    Resize(u16, u16),
}

/// Resolved `[keybindings]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap {
    pub toggle_focus: KeyCode,
    pub search_focus: KeyCode,
    pub help: KeyCode,
    pub command: KeyCode,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            toggle_focus: KeyCode::Tab,
            search_focus: KeyCode::Char('/'),
            help: KeyCode::Char('?'),
            command: KeyCode::Char(':'),
        }
    }
}

impl Keymap {
    /// Unrecognised values keep their default binding.
    pub fn from_config(cfg: &KeybindingsConfig) -> Self {
        let defaults = Self::default();
        let bind = |name: &str, raw: &str, fallback: KeyCode| {
            parse_key(raw).unwrap_or_else(|| {
                tracing::warn!(binding = name, value = raw, "unrecognised key, keeping default");
                fallback
            })
        };
        Self {
            toggle_focus: bind("toggle_focus", &cfg.toggle_focus, defaults.toggle_focus),
            search_focus: bind("search_focus", &cfg.search_focus, defaults.search_focus),
            help: bind("help", &cfg.help, defaults.help),
            command: bind("command", &cfg.command, defaults.command),
        }
    }

    /// Map a raw crossterm [`Event`] in normal (navigation) mode.
    ///
    /// Returns `None` for events with no meaning to the application (mouse
    /// events, unbound keys).
    pub fn to_app_event(&self, event: Event) -> Option<AppEvent> {
        match event {
            Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
            Event::Key(key) => self.bound(key).or_else(|| map_key(key)),
            _ => None,
        }
    }

    /// Map a raw crossterm [`Event`] while a text input has focus. Only the
    /// focus toggle is honoured, and only when it cannot be typed; `Tab`
    /// stands in otherwise.
    pub fn to_app_event_insert(&self, event: Event) -> Option<AppEvent> {
        match event {
            Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
            Event::Key(key) if unmodified(&key) && key.code == self.insert_toggle() => {
                Some(AppEvent::FocusNext)
            }
            Event::Key(key) => map_key_insert(key),
            _ => None,
        }
    }

    fn insert_toggle(&self) -> KeyCode {
        match self.toggle_focus {
            KeyCode::Char(_) => KeyCode::Tab,
            other => other,
        }
    }

    fn bound(&self, key: KeyEvent) -> Option<AppEvent> {
        if !unmodified(&key) {
            return None;
        }
        [
            (self.toggle_focus, AppEvent::FocusNext),
            (self.search_focus, AppEvent::SearchFocus),
            (self.help, AppEvent::Help),
            (self.command, AppEvent::CommandMode),
        ]
        .into_iter()
        .find(|(code, _)| *code == key.code)
        .map(|(_, event)| event)
    }
}

/// No modifier, or Shift alone (`?` and `:` are shifted on most layouts).
fn unmodified(key: &KeyEvent) -> bool {
    key.modifiers == KeyModifiers::NONE || key.modifiers == KeyModifiers::SHIFT
}

fn parse_key(raw: &str) -> Option<KeyCode> {
    let raw = raw.trim();
    let mut chars = raw.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    match raw.to_ascii_lowercase().as_str() {
        "tab" => Some(KeyCode::Tab),
        "backtab" | "shift+tab" => Some(KeyCode::BackTab),
        "space" => Some(KeyCode::Char(' ')),
        f => f
            .strip_prefix('f')
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=12).contains(n))
            .map(KeyCode::F),
    }
}

/// How a key is written in the help popup.
pub fn key_label(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}

fn map_key(key: KeyEvent) -> Option<AppEvent> {
    use KeyCode::*;
    use KeyModifiers as Mod;

    match key.code {
        Char('q') if key.modifiers == Mod::NONE => Some(AppEvent::Quit),
        Char('c') if key.modifiers == Mod::CONTROL => Some(AppEvent::Quit),

        Char('r') if key.modifiers == Mod::NONE => Some(AppEvent::Reload),

        PageUp => Some(AppEvent::ScrollUp),
        PageDown => Some(AppEvent::ScrollDown),
        Char('u') if key.modifiers == Mod::CONTROL => Some(AppEvent::ScrollUp),
        Char('d') if key.modifiers == Mod::CONTROL => Some(AppEvent::ScrollDown),

        Up | Char('k') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Up)),
        Down | Char('j') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Down)),
        Left | Char('h') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Left)),
        Right | Char('l') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Right)),

        // Shifted characters included, e.g. `?` and `:` on most layouts.
        Char(c) if key.modifiers == Mod::NONE || key.modifiers == Mod::SHIFT => {
            Some(AppEvent::Char(c))
        }

        Backspace if key.modifiers == Mod::NONE => Some(AppEvent::Backspace),
        Enter if key.modifiers == Mod::NONE => Some(AppEvent::Enter),
        Esc => Some(AppEvent::Escape),

        _ => None,
    }
}

fn map_key_insert(key: KeyEvent) -> Option<AppEvent> {
    use KeyCode::*;
    use KeyModifiers as Mod;

    match key.code {
        Char('c') if key.modifiers == Mod::CONTROL => Some(AppEvent::Quit),
        Char('u') if key.modifiers == Mod::CONTROL => Some(AppEvent::ClearInput),

        Up => Some(AppEvent::Nav(Direction::Up)),
        Down => Some(AppEvent::Nav(Direction::Down)),
        Left => Some(AppEvent::Nav(Direction::Left)),
        Right => Some(AppEvent::Nav(Direction::Right)),

        Char(c) if key.modifiers == Mod::NONE || key.modifiers == Mod::SHIFT => {
            Some(AppEvent::Char(c))
        }

        Backspace if key.modifiers == Mod::NONE => Some(AppEvent::Backspace),
        Enter if key.modifiers == Mod::NONE => Some(AppEvent::Enter),
        Esc => Some(AppEvent::Escape),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn press(code: KeyCode) -> Event {
        key(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> Event {
        key(code, KeyModifiers::CONTROL)
    }

    fn to_app_event(event: Event) -> Option<AppEvent> {
        Keymap::default().to_app_event(event)
    }

    fn to_app_event_insert(event: Event) -> Option<AppEvent> {
        Keymap::default().to_app_event_insert(event)
    }

    #[test]
    fn quit_keys() {
        assert_eq!(to_app_event(press(KeyCode::Char('q'))), Some(AppEvent::Quit));
        assert_eq!(to_app_event(ctrl(KeyCode::Char('c'))), Some(AppEvent::Quit));
    }

    #[test]
    fn focus_keys() {
        assert_eq!(to_app_event(press(KeyCode::Tab)), Some(AppEvent::FocusNext));
        assert_eq!(to_app_event(press(KeyCode::Char('/'))), Some(AppEvent::SearchFocus));
        assert_eq!(to_app_event(press(KeyCode::Char('r'))), Some(AppEvent::Reload));
    }

    #[test]
    fn nav_arrows_and_hjkl() {
        for (code, dir) in [
            (KeyCode::Up, Direction::Up),
            (KeyCode::Char('k'), Direction::Up),
            (KeyCode::Down, Direction::Down),
            (KeyCode::Char('j'), Direction::Down),
            (KeyCode::Left, Direction::Left),
            (KeyCode::Char('h'), Direction::Left),
            (KeyCode::Right, Direction::Right),
            (KeyCode::Char('l'), Direction::Right),
        ] {
            assert_eq!(to_app_event(press(code)), Some(AppEvent::Nav(dir)), "{code:?}");
        }
    }

    #[test]
    fn scroll_keys() {
        assert_eq!(to_app_event(press(KeyCode::PageUp)), Some(AppEvent::ScrollUp));
        assert_eq!(to_app_event(ctrl(KeyCode::Char('d'))), Some(AppEvent::ScrollDown));
    }

    #[test]
    fn help_and_command_keys() {
        assert_eq!(
            to_app_event(key(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some(AppEvent::Help)
        );
        assert_eq!(to_app_event(press(KeyCode::Char(':'))), Some(AppEvent::CommandMode));
    }

    #[test]
    fn shifted_chars_forwarded() {
        assert_eq!(
            to_app_event(key(KeyCode::Char('G'), KeyModifiers::SHIFT)),
            Some(AppEvent::Char('G'))
        );
    }

    fn keymap(toggle_focus: &str, search_focus: &str, help: &str, command: &str) -> Keymap {
        Keymap::from_config(&KeybindingsConfig {
            toggle_focus: toggle_focus.to_string(),
            search_focus: search_focus.to_string(),
            help: help.to_string(),
            command: command.to_string(),
        })
    }

    #[test]
    fn keybindings_are_read_from_config() {
        let map = keymap("F2", "s", "F1", ";");
        assert_eq!(map.to_app_event(press(KeyCode::F(2))), Some(AppEvent::FocusNext));
        assert_eq!(map.to_app_event(press(KeyCode::Char('s'))), Some(AppEvent::SearchFocus));
        assert_eq!(map.to_app_event(press(KeyCode::F(1))), Some(AppEvent::Help));
        assert_eq!(map.to_app_event(press(KeyCode::Char(';'))), Some(AppEvent::CommandMode));

        // The old defaults are plain keys again.
        assert_eq!(map.to_app_event(press(KeyCode::Tab)), None);
        assert_eq!(map.to_app_event(press(KeyCode::Char('/'))), Some(AppEvent::Char('/')));
        assert_eq!(map.to_app_event(press(KeyCode::Char(':'))), Some(AppEvent::Char(':')));

        // Insert mode follows the rebound toggle and still types letters.
        assert_eq!(map.to_app_event_insert(press(KeyCode::F(2))), Some(AppEvent::FocusNext));
        assert_eq!(map.to_app_event_insert(press(KeyCode::Char('s'))), Some(AppEvent::Char('s')));
    }

    #[test]
    fn typable_toggle_falls_back_to_tab_in_insert_mode() {
        let map = keymap("n", "/", "?", ":");
        assert_eq!(map.to_app_event(press(KeyCode::Char('n'))), Some(AppEvent::FocusNext));
        assert_eq!(map.to_app_event_insert(press(KeyCode::Char('n'))), Some(AppEvent::Char('n')));
        assert_eq!(map.to_app_event_insert(press(KeyCode::Tab)), Some(AppEvent::FocusNext));
    }

    #[test]
    fn unknown_binding_keeps_default() {
        let map = keymap("Hyper+Tab", "", "F13", "Space");
        assert_eq!(map.toggle_focus, KeyCode::Tab);
        assert_eq!(map.search_focus, KeyCode::Char('/'));
        assert_eq!(map.help, KeyCode::Char('?'));
        assert_eq!(map.command, KeyCode::Char(' '));
        assert_eq!(key_label(map.command), "Space");
        assert_eq!(key_label(KeyCode::F(1)), "F1");
    }

    #[test]
    fn unbound_key_returns_none() {
        assert_eq!(to_app_event(press(KeyCode::F(5))), None);
    }

    #[test]
    fn insert_mode_shortcut_letters_are_chars() {
        for ch in ['h', 'j', 'k', 'l', 'q', 'r', '/', '?', ':', 'é'] {
            assert_eq!(
                to_app_event_insert(press(KeyCode::Char(ch))),
                Some(AppEvent::Char(ch)),
                "insert mode: '{ch}' should type itself"
            );
        }
    }

    #[test]
    fn insert_mode_arrows_and_clear() {
        assert_eq!(
            to_app_event_insert(press(KeyCode::Down)),
            Some(AppEvent::Nav(Direction::Down))
        );
        assert_eq!(to_app_event_insert(ctrl(KeyCode::Char('u'))), Some(AppEvent::ClearInput));
        assert_eq!(to_app_event_insert(ctrl(KeyCode::Char('c'))), Some(AppEvent::Quit));
        assert_eq!(to_app_event_insert(press(KeyCode::Esc)), Some(AppEvent::Escape));
    }
}
