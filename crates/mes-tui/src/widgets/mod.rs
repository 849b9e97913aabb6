//! Ratatui widgets for the MES TUI.

pub mod command_bar;
pub mod header;
pub mod help;
pub mod line_input;
pub mod page_view;
pub mod results;
pub mod search_bar;
pub mod sidebar;
