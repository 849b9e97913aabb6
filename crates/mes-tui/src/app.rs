//! Top-level application state and the main event loop.
//!
//! [`App::run`] sets up the terminal, drives the crossterm event loop, and
//! tears everything down cleanly on exit or panic. Network work (search
//! cycles, page fetches) runs on the tokio runtime whose handle the app is
//! given; results come back through a watch channel (search) and an
//! unbounded mpsc channel (pages) that the loop drains before every frame.

use crate::{
    commands::Command,
    event::{AppEvent, Direction, Keymap},
    theme::Theme,
    widgets::{
        command_bar::{CommandBar, CommandBarState},
        header::Header,
        help::HelpPopup,
        line_input::LineInput,
        page_view::{PageContent, PageView, PageViewState},
        results::{ResultsOverlay, ResultsState},
        search_bar::SearchBar,
        sidebar::{Sidebar, SidebarState},
    },
};
use crossterm::{
    event::{self as ct_event, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mes_api::MesClient;
use mes_core::{
    catalog,
    config::Config,
    records,
    search::{SearchAggregator, SearchKey, SearchState},
    ResourceKind, SessionStore,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDir, Layout, Rect},
    Frame, Terminal,
};
use std::{io, path::PathBuf, sync::Arc, time::Duration};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Page,
    Search,
    /// Vim-style `:` command line is active.
    Command,
}

/// Outcome of a background page fetch, tagged with the load it answers.
#[derive(Debug)]
struct PageLoad {
    seq: u64,
    kind: ResourceKind,
    outcome: Result<Vec<serde_json::Value>, String>,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub focus: Focus,
    /// Focus before entering command mode, restored on exit.
    pub prev_focus: Focus,
    pub theme: Theme,
    pub config: Config,
    pub keymap: Keymap,
    pub show_help: bool,
    pub command_bar: CommandBarState,
    pub search_input: LineInput,
    pub results: ResultsState,
    /// Last search state received from the aggregator.
    pub search: SearchState,
    pub sidebar: SidebarState,
    pub page: PageViewState,
    /// Display name of the logged-in user.
    pub user: Option<String>,
    pub quit: bool,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    state: AppState,
    aggregator: SearchAggregator,
    search_rx: watch::Receiver<SearchState>,
    sessions: SessionStore,
    client: MesClient,
    runtime: Handle,
    loads_tx: mpsc::UnboundedSender<PageLoad>,
    loads_rx: mpsc::UnboundedReceiver<PageLoad>,
    load_seq: u64,
    /// Where `:logout` persists the cleared session.
    session_file: Option<PathBuf>,
}

impl App {
    pub fn new(
        config: Config,
        theme: Theme,
        sessions: SessionStore,
        client: MesClient,
        runtime: Handle,
    ) -> Self {
        let aggregator = SearchAggregator::new(
            Arc::new(client.clone()),
            sessions.clone(),
            config.search.debounce(),
            runtime.clone(),
        );
        let search_rx = aggregator.subscribe();
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        let user = sessions.current().map(|s| s.display_name().to_string());
        let keymap = Keymap::from_config(&config.keybindings);

        let state = AppState {
            focus: Focus::Sidebar,
            prev_focus: Focus::Sidebar,
            theme,
            config,
            keymap,
            show_help: false,
            command_bar: CommandBarState::default(),
            search_input: LineInput::default(),
            results: ResultsState::default(),
            search: SearchState::default(),
            sidebar: SidebarState::default(),
            page: PageViewState::new(&catalog::DASHBOARD),
            user,
            quit: false,
        };

        App {
            state,
            aggregator,
            search_rx,
            sessions,
            client,
            runtime,
            loads_tx,
            loads_rx,
            load_seq: 0,
            session_file: None,
        }
    }

    pub fn with_session_file(mut self, path: PathBuf) -> Self {
        self.session_file = Some(path);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Set up the terminal, run the event loop, and restore the terminal on exit.
    pub fn run(mut self) -> anyhow::Result<()> {
        install_panic_hook();

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        // Always restore the terminal, even if the loop returned an error.
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        loop {
            self.sync();
            {
                let s = &self.state;
                terminal.draw(|frame| draw(frame, s))?;
            }

            if self.state.quit {
                break;
            }

            if ct_event::poll(Duration::from_millis(16))? {
                match ct_event::read()? {
                    Event::Key(key) if key.kind == crossterm::event::KeyEventKind::Press => {
                        let raw = Event::Key(key);
                        let app_event = if is_insert_mode(self.state.focus) {
                            self.state.keymap.to_app_event_insert(raw)
                        } else {
                            self.state.keymap.to_app_event(raw)
                        };
                        if let Some(ev) = app_event {
                            tracing::debug!(focus = ?self.state.focus, event = ?ev, "key event");
                            self.handle(ev);
                        }
                    }
                    other => {
                        if let Some(ev) = self.state.keymap.to_app_event(other) {
                            self.handle(ev);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Pull in everything that changed off-thread since the last frame.
    fn sync(&mut self) {
        if self.search_rx.has_changed().unwrap_or(false) {
            self.state.search = self.search_rx.borrow_and_update().clone();
        }
        while let Ok(load) = self.loads_rx.try_recv() {
            self.apply_load(load);
        }
        self.state.user = self.sessions.current().map(|s| s.display_name().to_string());
    }

    fn handle(&mut self, event: AppEvent) {
        // Help popup swallows everything but its close keys.
        if self.state.show_help {
            if matches!(event, AppEvent::Help | AppEvent::Escape | AppEvent::Quit) {
                tracing::debug!("help popup closed");
                self.state.show_help = false;
            }
            return;
        }

        match self.state.focus {
            Focus::Command => return self.handle_command_bar(event),
            Focus::Search => return self.handle_search(event),
            Focus::Sidebar | Focus::Page => {}
        }

        let s = &mut self.state;
        match event {
            AppEvent::Help => {
                tracing::debug!("help popup opened");
                s.show_help = true;
            }
            AppEvent::CommandMode => {
                tracing::debug!(prev_focus = ?s.focus, "entering command mode");
                s.prev_focus = s.focus;
                s.command_bar.clear();
                s.focus = Focus::Command;
            }
            AppEvent::Quit => {
                tracing::debug!("quit");
                s.quit = true;
            }
            AppEvent::FocusNext => {
                if s.focus == Focus::Sidebar {
                    s.focus = Focus::Page;
                } else {
                    self.focus_search();
                }
            }
            AppEvent::SearchFocus => self.focus_search(),
            AppEvent::Reload => self.load_page(),
            AppEvent::Resize(_, _) | AppEvent::Escape => {}
            other => match s.focus {
                Focus::Sidebar => {
                    if let Some(page) = s.sidebar.handle(&other) {
                        self.navigate(page.path);
                        self.state.focus = Focus::Page;
                    }
                }
                Focus::Page => s.page.handle(&other),
                Focus::Search | Focus::Command => {}
            },
        }
    }

    fn focus_search(&mut self) {
        tracing::debug!(from = ?self.state.focus, "focus -> Search");
        self.state.focus = Focus::Search;
        self.aggregator.on_focus();
    }

    fn handle_search(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => self.state.quit = true,
            AppEvent::Escape => {
                self.aggregator.on_key_down(SearchKey::Escape);
                self.state.search_input.clear();
                self.state.results.reset();
                self.state.focus = Focus::Sidebar;
            }
            AppEvent::FocusNext => {
                self.aggregator.on_blur_outside();
                self.state.focus = Focus::Sidebar;
            }
            AppEvent::Enter => {
                let navigation = if self.state.results.highlight == 0 {
                    self.aggregator.on_key_down(SearchKey::Enter)
                } else {
                    let snapshot = self.aggregator.snapshot();
                    self.state
                        .results
                        .selected(&snapshot.results)
                        .map(|result| self.aggregator.on_select(result))
                };
                if let Some(navigation) = navigation {
                    self.state.search_input.clear();
                    self.state.results.reset();
                    self.navigate(&navigation.path);
                    self.state.focus = Focus::Page;
                }
            }
            AppEvent::Nav(Direction::Up | Direction::Down) => {
                let total = self.aggregator.snapshot().total_count();
                self.state.results.handle(&event, total);
            }
            AppEvent::ClearInput => {
                self.state.search_input.clear();
                self.state.results.reset();
                self.aggregator.on_clear();
            }
            other => {
                if self.state.search_input.handle(&other) {
                    self.state.results.reset();
                    self.aggregator.on_query_change(&self.state.search_input.text);
                }
            }
        }
    }

    fn handle_command_bar(&mut self, event: AppEvent) {
        let s = &mut self.state;
        match event {
            AppEvent::Escape => {
                tracing::debug!("command bar cancelled");
                s.command_bar.clear();
                s.focus = s.prev_focus;
            }
            AppEvent::Enter => match Command::parse(&s.command_bar.input.text) {
                Ok(cmd) => {
                    tracing::debug!(command = ?cmd, "executing command");
                    s.command_bar.clear();
                    s.focus = s.prev_focus;
                    self.execute(cmd);
                }
                Err(msg) if msg.is_empty() => {
                    s.command_bar.clear();
                    s.focus = s.prev_focus;
                }
                Err(msg) => s.command_bar.error = Some(msg),
            },
            other => s.command_bar.handle(&other),
        }
    }

    fn execute(&mut self, cmd: Command) {
        match cmd {
            Command::Quit => self.state.quit = true,
            Command::Help => self.state.show_help = !self.state.show_help,
            Command::Theme(name) => {
                if let Some(theme) = Theme::by_name(&name) {
                    self.state.theme = theme;
                }
            }
            Command::Go(page) => {
                self.navigate(page.path);
                self.state.focus = Focus::Page;
            }
            Command::Reload => self.load_page(),
            Command::Logout => {
                self.sessions.logout();
                if let Some(path) = &self.session_file {
                    if let Err(e) = self.sessions.persist(path) {
                        tracing::warn!(error = %e, path = %path.display(), "could not remove session file");
                    }
                }
                self.state.user = None;
                self.load_page();
            }
        }
    }

    fn navigate(&mut self, path: &str) {
        let Some(page) = catalog::find_by_path(path) else {
            tracing::warn!(path, "navigate: unknown page");
            return;
        };
        tracing::debug!(path, "navigate");
        self.state.page = PageViewState::new(page);
        self.state.sidebar.select_path(path);
        self.load_page();
    }

    /// Fetch the records of the current page in the background.
    fn load_page(&mut self) {
        let Some(kind) = self.state.page.kind else {
            return;
        };
        self.load_seq += 1;
        let seq = self.load_seq;

        let Some(session) = self.sessions.current() else {
            self.state.page.content =
                PageContent::Failed("non connecté : lancez `mes login` puis relancez".to_string());
            return;
        };

        self.state.page.content = PageContent::Loading;
        let client = self.client.clone();
        let tx = self.loads_tx.clone();
        self.runtime.spawn(async move {
            let outcome = client.list(kind, &session).await.map_err(|e| e.to_string());
            // The receiver is gone only once the app has exited.
            let _ = tx.send(PageLoad { seq, kind, outcome });
        });
    }

    fn apply_load(&mut self, load: PageLoad) {
        if load.seq != self.load_seq {
            tracing::debug!(seq = load.seq, current = self.load_seq, "page: stale load discarded");
            return;
        }
        let page = &mut self.state.page;
        page.cursor = 0;
        page.content = match load.outcome {
            Ok(raw) => {
                let projected = records::project(load.kind, raw);
                tracing::debug!(kind = %load.kind, count = projected.len(), "page: loaded");
                PageContent::Records(projected)
            }
            Err(e) => {
                tracing::warn!(kind = %load.kind, error = %e, "page: load failed");
                PageContent::Failed(e)
            }
        };
    }
}

/// Text-input widgets get the insert-mode key mapping.
fn is_insert_mode(focus: Focus) -> bool {
    matches!(focus, Focus::Search | Focus::Command)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn draw(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    // Vertical: 1-line header | body | 3-line search bar
    let vert = Layout::default()
        .direction(LayoutDir::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .split(area);

    let pct = state.config.ui.sidebar_width_pct.min(60);
    let horiz = Layout::default()
        .direction(LayoutDir::Horizontal)
        .constraints([Constraint::Percentage(pct), Constraint::Fill(1)])
        .split(vert[1]);

    frame.render_widget(
        Header::new(state.page.page, state.user.as_deref(), &state.theme),
        vert[0],
    );
    frame.render_widget(
        Sidebar::new(
            &state.sidebar,
            state.page.page.path,
            state.focus == Focus::Sidebar,
            &state.theme,
        ),
        horiz[0],
    );
    frame.render_widget(
        PageView::new(&state.page, state.focus == Focus::Page, &state.theme),
        horiz[1],
    );
    let search_bar = SearchBar::new(
        &state.search_input,
        &state.search,
        state.focus == Focus::Search,
        &state.theme,
    );
    let cursor = search_bar.cursor_position(vert[2]);
    frame.render_widget(search_bar, vert[2]);

    // Results float above the search bar, over the body.
    if state.search.is_open {
        let overlay = ResultsOverlay::new(&state.search, &state.results, &state.theme);
        let height = overlay.desired_height().min(vert[1].height);
        let overlay_area = Rect {
            y: vert[2].y.saturating_sub(height),
            height,
            ..vert[2]
        };
        frame.render_widget(overlay, overlay_area);
    }

    if state.show_help {
        frame.render_widget(HelpPopup::new(&state.theme, &state.keymap), area);
    }

    // Command bar overlays the bottom row of the screen.
    if state.focus == Focus::Command {
        let cmd_area = Rect {
            y: area.bottom() - 1,
            height: 1,
            ..area
        };
        frame.render_widget(CommandBar::new(&state.command_bar, &state.theme), cmd_area);
        let col = state.command_bar.cursor_col(cmd_area);
        frame.set_cursor_position((col, cmd_area.y));
        return;
    }

    if state.focus == Focus::Search {
        frame.set_cursor_position(cursor);
    }
}

// ---------------------------------------------------------------------------
// Terminal helpers
// ---------------------------------------------------------------------------

fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original(info);
    }));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
