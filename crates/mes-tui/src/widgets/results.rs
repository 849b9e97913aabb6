//! Results overlay: the grouped dropdown that floats above the search bar
//! while the search is open.
//!
//! `↑`/`↓` move the highlight across groups; the highlight is an index into
//! the results in display order, so index 0 is always the result a plain
//! `Enter` selects.

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use mes_core::search::{Phase, SearchState};
use mes_core::types::{ResultSet, SearchResult};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget},
};

/// Upper bound on the overlay height, borders included.
const MAX_HEIGHT: u16 = 18;

#[derive(Debug, Default)]
pub struct ResultsState {
    pub highlight: usize,
}

impl ResultsState {
    pub fn reset(&mut self) {
        self.highlight = 0;
    }

    pub fn handle(&mut self, event: &AppEvent, total: usize) {
        match event {
            AppEvent::Nav(Direction::Up) => {
                self.highlight = self.highlight.saturating_sub(1);
            }
            AppEvent::Nav(Direction::Down) => {
                if self.highlight + 1 < total {
                    self.highlight += 1;
                }
            }
            _ => return,
        }
        tracing::debug!(highlight = self.highlight, total, "results: highlight moved");
    }

    /// The highlighted result, clamped to what is currently displayed.
    pub fn selected<'a>(&self, results: &'a ResultSet) -> Option<&'a SearchResult> {
        let total = results.total_count();
        if total == 0 {
            return None;
        }
        results.get(self.highlight.min(total - 1))
    }
}

pub struct ResultsOverlay<'a> {
    search: &'a SearchState,
    state: &'a ResultsState,
    theme: &'a Theme,
}

impl<'a> ResultsOverlay<'a> {
    pub fn new(search: &'a SearchState, state: &'a ResultsState, theme: &'a Theme) -> Self {
        Self {
            search,
            state,
            theme,
        }
    }

    /// Rows the overlay wants, borders included.
    pub fn desired_height(&self) -> u16 {
        let (lines, _) = self.lines();
        (lines.len() as u16 + 2).min(MAX_HEIGHT)
    }

    /// Rendered lines plus the index of the highlighted line, if any.
    fn lines(&self) -> (Vec<Line<'static>>, Option<usize>) {
        let results = &self.search.results;
        let mut lines = Vec::new();
        let mut highlighted = None;

        if results.is_empty() {
            let line = match self.search.phase {
                Phase::Ready => Line::from(Span::styled(
                    format!("Aucun résultat pour «{}»", self.search.query.trim()),
                    self.theme.search_empty,
                )),
                _ => Line::from(Span::styled("Recherche…", self.theme.search_loading)),
            };
            lines.push(line);
        } else {
            let total = results.total_count();
            let selected = self.state.highlight.min(total - 1);
            let mut index = 0;
            for group in &results.groups {
                lines.push(Line::from(Span::styled(
                    group.category.clone(),
                    self.theme.category_style(&group.category),
                )));
                for result in &group.results {
                    let mut line = Line::from(vec![
                        Span::raw(format!("  {} ", result.icon)),
                        Span::styled(
                            result.display_name.clone(),
                            ratatui::style::Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw("  "),
                        Span::styled(result.description.clone(), self.theme.search_description),
                    ]);
                    if index == selected {
                        line = line.style(self.theme.search_highlight);
                        highlighted = Some(lines.len());
                    }
                    lines.push(line);
                    index += 1;
                }
            }
            if self.search.is_loading() {
                lines.push(Line::from(Span::styled(
                    "Recherche en cours…",
                    self.theme.search_loading,
                )));
            }
        }

        if !results.failed_sources.is_empty() {
            let names: Vec<&str> = results.failed_sources.iter().map(|k| k.category()).collect();
            lines.push(Line::from(Span::styled(
                format!("⚠ Sources indisponibles : {}", names.join(", ")),
                self.theme.search_failed,
            )));
        }

        (lines, highlighted)
    }
}

impl Widget for ResultsOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(" Résultats ")
            .border_style(self.theme.border_focused);
        let inner = block.inner(area);
        block.render(area, buf);

        let (lines, highlighted) = self.lines();
        // Keep the highlighted row inside the viewport.
        let height = inner.height.max(1) as usize;
        let offset = highlighted
            .map(|h| h.saturating_sub(height - 1))
            .unwrap_or(0);
        Paragraph::new(lines)
            .scroll((offset as u16, 0))
            .render(inner, buf);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mes_core::catalog;
    use mes_core::matching::Needle;
    use mes_core::types::ResourceKind;
    use pretty_assertions::assert_eq;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (area.y..area.bottom())
            .map(|y| {
                (area.x..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(search: &SearchState, state: &ResultsState) -> String {
        let theme = Theme::load_default();
        let area = Rect::new(0, 0, 70, 12);
        let mut buf = Buffer::empty(area);
        ResultsOverlay::new(search, state, &theme).render(area, &mut buf);
        buffer_text(&buf)
    }

    fn ready(query: &str, results: ResultSet) -> SearchState {
        let mut search = SearchState::default();
        search.is_open = true;
        search.query = query.to_string();
        search.phase = Phase::Ready;
        search.results = results;
        search
    }

    fn pages(query: &str) -> ResultSet {
        let needle = Needle::new(query).unwrap();
        ResultSet::grouped(needle.as_str(), catalog::match_pages(&needle), Vec::new())
    }

    #[test]
    fn empty_ready_state_says_no_results() {
        let text = render(&ready("zzz", ResultSet::empty()), &ResultsState::default());
        assert!(text.contains("Aucun résultat pour «zzz»"), "{text}");
    }

    #[test]
    fn groups_render_with_category_headings() {
        let text = render(&ready("ress", pages("ress")), &ResultsState::default());
        assert!(text.contains("Ressources"), "{text}");
        assert!(text.contains("Aller à /ressources"), "{text}");
    }

    #[test]
    fn failed_sources_are_listed() {
        let mut set = pages("equip");
        set.failed_sources = vec![ResourceKind::Equipment, ResourceKind::Process];
        let text = render(&ready("equip", set), &ResultsState::default());
        assert!(text.contains("Sources indisponibles : Équipement, Processus"), "{text}");
    }

    #[test]
    fn highlight_is_clamped_and_selects_in_display_order() {
        let set = pages("e");
        let total = set.total_count();
        let mut state = ResultsState::default();
        for _ in 0..total + 3 {
            state.handle(&AppEvent::Nav(Direction::Down), total);
        }
        assert_eq!(state.highlight, total - 1);
        assert_eq!(state.selected(&set), set.get(total - 1));

        state.handle(&AppEvent::Nav(Direction::Up), total);
        assert_eq!(state.highlight, total - 2);
        assert!(state.selected(&ResultSet::empty()).is_none());
    }

    #[test]
    fn desired_height_is_capped() {
        let theme = Theme::load_default();
        let search = ready("e", pages("e"));
        let state = ResultsState::default();
        let height = ResultsOverlay::new(&search, &state, &theme).desired_height();
        assert!(height >= 3 && height <= MAX_HEIGHT);
    }
}
