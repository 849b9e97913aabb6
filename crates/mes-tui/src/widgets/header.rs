//! Header: one-line strip at the top of the screen with the application
//! title, the current page, and who is logged in.

use crate::theme::Theme;
use mes_core::catalog::NavigablePage;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

pub struct Header<'a> {
    page: &'a NavigablePage,
    user: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(page: &'a NavigablePage, user: Option<&'a str>, theme: &'a Theme) -> Self {
        Self { page, user, theme }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let left = Line::from(vec![
            Span::styled(" Système MES ", self.theme.header_title),
            Span::raw(" › "),
            Span::styled(self.page.name, self.theme.header_page),
        ]);
        buf.set_line(area.x, area.y, &left, area.width);

        let who = match self.user {
            Some(name) => Span::styled(format!("Connecté : {name}"), self.theme.header_user),
            None => Span::styled(
                "Non connecté",
                Style::default().add_modifier(Modifier::DIM),
            ),
        };
        let right = Line::from(vec![
            who,
            Span::styled("  /:rechercher ?:aide q:quitter ", Style::default().add_modifier(Modifier::DIM)),
        ]);
        let width = right.width() as u16;
        let x = area.right().saturating_sub(width).max(area.x);
        buf.set_line(x, area.y, &right, area.right().saturating_sub(x));
    }
}
