//! Search bar: the text input at the bottom of the screen.
//!
//! Editing happens in a [`LineInput`]; the app shell forwards every text
//! change to the search aggregator. The title shows the result count of the
//! last settled search and a marker while sources are still loading.

use crate::theme::Theme;
use crate::widgets::line_input::LineInput;
use mes_core::search::{Phase, SearchState};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

const PLACEHOLDER: &str = "Rechercher équipements, matériaux, opérateurs, pages… (/)";

pub struct SearchBar<'a> {
    input: &'a LineInput,
    search: &'a SearchState,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> SearchBar<'a> {
    pub fn new(input: &'a LineInput, search: &'a SearchState, focused: bool, theme: &'a Theme) -> Self {
        Self {
            input,
            search,
            focused,
            theme,
        }
    }

    /// Absolute terminal position of the text cursor within `area`.
    pub fn cursor_position(&self, area: Rect) -> (u16, u16) {
        let x = (area.x + 1 + self.input.cursor_col()).min(area.right().saturating_sub(2));
        (x, area.y + 1)
    }

    fn title(&self) -> Line<'static> {
        let mut spans = vec![Span::raw(" Recherche ")];
        match self.search.phase {
            Phase::Loading => spans.push(Span::styled("⟳ ", self.theme.search_loading)),
            Phase::Ready => spans.push(Span::raw(format!("({}) ", self.search.total_count()))),
            Phase::Idle | Phase::Debouncing => {}
        }
        Line::from(spans)
    }
}

impl Widget for SearchBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(self.title())
            .border_style(self.theme.border(self.focused));
        let inner = block.inner(area);
        block.render(area, buf);

        let line = if self.input.text.is_empty() && !self.focused {
            Line::from(Span::styled(
                PLACEHOLDER,
                Style::default().add_modifier(Modifier::DIM),
            ))
        } else {
            Line::from(self.input.text.as_str())
        };
        Paragraph::new(line).render(inner, buf);
    }
}
