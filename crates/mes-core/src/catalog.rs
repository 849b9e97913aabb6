//! Static catalog of navigable pages.
//!
//! The catalog is fixed at compile time and matched synchronously on every
//! search; it never touches the network.

use crate::matching::{fold, Needle};
use crate::types::{ResultKind, SearchResult};
use serde::Serialize;

/// A page of the application the user can jump to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigablePage {
    pub name: &'static str,
    pub path: &'static str,
    pub icon: &'static str,
    pub category: &'static str,
}

pub const DASHBOARD: NavigablePage = NavigablePage {
    name: "Tableau de bord",
    path: "/",
    icon: "⌂",
    category: "Navigation",
};

pub const PAGES: [NavigablePage; 7] = [
    DASHBOARD,
    NavigablePage {
        name: "Processus",
        path: "/processus",
        icon: "≡",
        category: "Production",
    },
    NavigablePage {
        name: "Ressources",
        path: "/ressources",
        icon: "▣",
        category: "Ressources",
    },
    NavigablePage {
        name: "Planification",
        path: "/planification",
        icon: "◷",
        category: "Production",
    },
    NavigablePage {
        name: "Équipements",
        path: "/equipements",
        icon: "⚙",
        category: "Ressources",
    },
    NavigablePage {
        name: "Matériaux",
        path: "/materiaux",
        icon: "▤",
        category: "Ressources",
    },
    NavigablePage {
        name: "Opérateurs",
        path: "/operateurs",
        icon: "☺",
        category: "Ressources",
    },
];

impl NavigablePage {
    pub fn to_result(&self) -> SearchResult {
        SearchResult {
            kind: ResultKind::Page,
            display_name: self.name.to_string(),
            description: format!("Aller à {}", self.path),
            navigation_path: self.path.to_string(),
            icon: self.icon,
            category: self.category.to_string(),
            raw_record: None,
        }
    }
}

/// Pages whose name or category contains the needle, in catalog order.
pub fn match_pages(needle: &Needle) -> Vec<SearchResult> {
    PAGES
        .iter()
        .filter(|p| needle.matches_any([p.name, p.category]))
        .map(NavigablePage::to_result)
        .collect()
}

pub fn find_by_path(path: &str) -> Option<&'static NavigablePage> {
    PAGES.iter().find(|p| p.path == path)
}

/// Resolve a page from a path (`/materiaux`), a bare slug (`materiaux`) or a
/// name (`Matériaux`, accents optional). Used by the `go` command.
pub fn resolve(target: &str) -> Option<&'static NavigablePage> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    if let Some(page) = find_by_path(target) {
        return Some(page);
    }
    let folded = fold(target);
    PAGES.iter().find(|p| {
        fold(p.name) == folded || p.path.trim_start_matches('/') == folded
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
