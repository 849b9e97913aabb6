//! Help popup: centred overlay listing the keybindings.
//!
//! Toggle with the help key (`?` unless rebound); close with it or `Escape`.
//! Rebindable keys are shown as configured.

use crate::event::{key_label, Keymap};
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget},
};

fn bindings(keymap: &Keymap) -> Vec<(String, &'static str)> {
    vec![
        ("q  /  Ctrl+c".to_string(), "Quitter"),
        (key_label(keymap.toggle_focus), "Focus suivant : menu → page → recherche"),
        (key_label(keymap.search_focus), "Rechercher"),
        ("↑ k  /  ↓ j".to_string(), "Naviguer dans le menu, la page ou les résultats"),
        ("Enter".to_string(), "Ouvrir la page / le résultat sélectionné"),
        ("Escape".to_string(), "Annuler la recherche"),
        ("Ctrl+u (recherche)".to_string(), "Effacer la recherche"),
        ("PageUp / PageDown".to_string(), "Défiler la page"),
        ("r".to_string(), "Recharger la page"),
        (key_label(keymap.command), "Commande (q, help, theme, go, reload, logout)"),
        (key_label(keymap.help), "Afficher / masquer l'aide"),
    ]
}

pub struct HelpPopup<'a> {
    theme: &'a Theme,
    keymap: &'a Keymap,
}

impl<'a> HelpPopup<'a> {
    pub fn new(theme: &'a Theme, keymap: &'a Keymap) -> Self {
        Self { theme, keymap }
    }
}

impl Widget for HelpPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bindings = bindings(self.keymap);
        let popup = centered_rect(78, bindings.len() as u16 + 2, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(format!(" Raccourcis ({} pour fermer) ", key_label(self.keymap.help)))
            .border_style(self.theme.border_focused);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let lines: Vec<Line> = bindings
            .into_iter()
            .map(|(key, desc)| {
                Line::from(vec![
                    Span::styled(
                        format!("  {:<22}", key),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(desc),
                ])
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
