//! Sidebar: navigation links to every page of the catalog.
//!
//! `↑`/`k` and `↓`/`j` move the cursor; `Enter` or `→`/`l` opens the page
//! under the cursor.

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use mes_core::catalog::{self, NavigablePage};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Line,
    widgets::{Block, Paragraph, Widget},
};

#[derive(Debug, Default)]
pub struct SidebarState {
    pub cursor: usize,
}

impl SidebarState {
    /// Returns the page to open, if the event selected one.
    pub fn handle(&mut self, event: &AppEvent) -> Option<&'static NavigablePage> {
        match event {
            AppEvent::Nav(Direction::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            AppEvent::Nav(Direction::Down) => {
                if self.cursor + 1 < catalog::PAGES.len() {
                    self.cursor += 1;
                }
                None
            }
            AppEvent::Enter | AppEvent::Nav(Direction::Right) => {
                let page = catalog::PAGES.get(self.cursor);
                if let Some(page) = page {
                    tracing::debug!(path = page.path, "sidebar: open");
                }
                page
            }
            _ => None,
        }
    }

    /// Move the cursor onto `path`, e.g. after navigating from search.
    pub fn select_path(&mut self, path: &str) {
        if let Some(idx) = catalog::PAGES.iter().position(|p| p.path == path) {
            self.cursor = idx;
        }
    }
}

pub struct Sidebar<'a> {
    state: &'a SidebarState,
    current_path: &'a str,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> Sidebar<'a> {
    pub fn new(state: &'a SidebarState, current_path: &'a str, focused: bool, theme: &'a Theme) -> Self {
        Self {
            state,
            current_path,
            focused,
            theme,
        }
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" Menu ")
            .border_style(self.theme.border(self.focused));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = catalog::PAGES
            .iter()
            .enumerate()
            .map(|(i, page)| {
                let marker = if self.focused && i == self.state.cursor { "›" } else { " " };
                let style = if page.path == self.current_path {
                    self.theme.nav_active
                } else {
                    self.theme.nav_inactive
                };
                Line::styled(format!("{marker} {} {}", page.icon, page.name), style)
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
