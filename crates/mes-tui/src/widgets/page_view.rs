//! Page view: the main pane on the right.
//!
//! Resource pages (equipment, materials, operators, processes) list the
//! records of their kind, fetched in the background by the app shell. Other
//! pages show a short summary of where they lead.
//!
//! # Navigation (when focused)
//!
//! | Key | Action |
//! |-----|--------|
//! | `↑` / `k` | Move the cursor up one record |
//! | `↓` / `j` | Move the cursor down one record |
//! | `PageUp` / `Ctrl+u` | Up one page |
//! | `PageDown` / `Ctrl+d` | Down one page |
//! | `r` | Reload |

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use mes_core::catalog::{self, NavigablePage};
use mes_core::records;
use mes_core::types::{ResourceKind, SearchResult};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};
use std::cell::Cell;

const PAGE_STEP: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    /// Page without remote data.
    Static,
    Loading,
    Records(Vec<SearchResult>),
    Failed(String),
}

#[derive(Debug)]
pub struct PageViewState {
    pub page: &'static NavigablePage,
    /// Set for pages that list one resource kind.
    pub kind: Option<ResourceKind>,
    pub content: PageContent,
    /// Index of the highlighted record.
    pub cursor: usize,
    /// Cached from the last render so `handle()` can page by screenfuls.
    last_height: Cell<usize>,
}

impl PageViewState {
    pub fn new(page: &'static NavigablePage) -> Self {
        let kind = ResourceKind::from_listing_path(page.path);
        Self {
            page,
            kind,
            content: if kind.is_some() {
                PageContent::Loading
            } else {
                PageContent::Static
            },
            cursor: 0,
            last_height: Cell::new(PAGE_STEP),
        }
    }

    pub fn record_count(&self) -> usize {
        match &self.content {
            PageContent::Records(records) => records.len(),
            _ => 0,
        }
    }

    pub fn handle(&mut self, event: &AppEvent) {
        let total = self.record_count();
        if total == 0 {
            return;
        }
        let page = self.last_height.get().max(1);
        self.cursor = match event {
            AppEvent::Nav(Direction::Up) => self.cursor.saturating_sub(1),
            AppEvent::Nav(Direction::Down) => (self.cursor + 1).min(total - 1),
            AppEvent::ScrollUp => self.cursor.saturating_sub(page),
            AppEvent::ScrollDown => (self.cursor + page).min(total - 1),
            _ => return,
        };
        tracing::debug!(cursor = self.cursor, total, "page: cursor moved");
    }

    /// First visible record index for a viewport of `height` rows.
    fn window_start(&self, height: usize) -> usize {
        self.cursor.saturating_sub(height.saturating_sub(1))
    }
}

pub struct PageView<'a> {
    state: &'a PageViewState,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> PageView<'a> {
    pub fn new(state: &'a PageViewState, focused: bool, theme: &'a Theme) -> Self {
        Self {
            state,
            focused,
            theme,
        }
    }

    fn static_lines(&self) -> Vec<Line<'static>> {
        let page = self.state.page;
        let mut lines = vec![
            Line::styled(
                format!("{} {}", page.icon, page.name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Line::styled(format!("Catégorie : {}", page.category), self.theme.search_description),
            Line::raw(""),
        ];
        let links: Vec<&NavigablePage> = catalog::PAGES
            .iter()
            .filter(|p| p.path != page.path && (page.path == "/" || p.category == page.category))
            .collect();
        if !links.is_empty() {
            lines.push(Line::raw("Pages liées :"));
            for link in links {
                lines.push(Line::raw(format!("  {} {}  ({})", link.icon, link.name, link.path)));
            }
            lines.push(Line::raw(""));
        }
        lines.push(Line::styled(
            "Appuyez sur / pour rechercher, : pour une commande.",
            self.theme.search_description,
        ));
        lines
    }

    /// Steps of the selected process, indented under its row.
    fn detail_lines(&self, record: &SearchResult) -> Vec<Line<'static>> {
        let (Some(kind), Some(raw)) = (self.state.kind, record.raw_record.as_ref()) else {
            return Vec::new();
        };
        records::details(kind, raw)
            .into_iter()
            .map(|detail| Line::styled(format!("    {detail}"), self.theme.search_description))
            .collect()
    }
}

impl Widget for PageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = match &self.state.content {
            PageContent::Records(records) => format!(" {} ({}) ", self.state.page.name, records.len()),
            _ => format!(" {} ", self.state.page.name),
        };
        let block = Block::bordered()
            .title(title)
            .border_style(self.theme.border(self.focused));
        let inner = block.inner(area);
        block.render(area, buf);

        let height = inner.height as usize;
        self.state.last_height.set(height);

        let lines: Vec<Line> = match &self.state.content {
            PageContent::Static => self.static_lines(),
            PageContent::Loading => vec![Line::styled("Chargement…", self.theme.search_loading)],
            PageContent::Failed(message) => vec![
                Line::styled("Impossible de charger les données.", self.theme.search_failed),
                Line::styled(message.clone(), self.theme.search_description),
                Line::raw(""),
                Line::styled("r pour réessayer", self.theme.search_description),
            ],
            PageContent::Records(records) if records.is_empty() => {
                vec![Line::styled("Aucun enregistrement.", self.theme.search_empty)]
            }
            PageContent::Records(records) => {
                let start = self.state.window_start(height);
                let mut lines = Vec::with_capacity(height);
                for (i, record) in records.iter().enumerate().skip(start) {
                    let line = Line::from(vec![
                        Span::raw(format!("{} ", record.icon)),
                        Span::styled(
                            record.display_name.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw("  "),
                        Span::styled(record.description.clone(), self.theme.search_description),
                    ]);
                    if self.focused && i == self.state.cursor {
                        lines.push(line.style(self.theme.search_highlight));
                        lines.extend(self.detail_lines(record));
                    } else {
                        lines.push(line);
                    }
                    if lines.len() >= height {
                        break;
                    }
                }
                lines.truncate(height);
                lines
            }
        };

        Paragraph::new(lines).render(inner, buf);
    }
}
