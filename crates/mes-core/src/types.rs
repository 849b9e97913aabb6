//! Core types for mes-core.
//!
//! This module defines the data shared by the search aggregator, the API
//! client and the TUI: the [`ResourceKind`] discriminant for the four remote
//! collections, the normalised [`SearchResult`] projection, and the grouped
//! [`ResultSet`] produced by one search cycle.

use serde::Serialize;

/// One of the four resource collections served by the MES API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Equipment,
    Material,
    Operator,
    Process,
}

impl ResourceKind {
    /// Fan-out issue order. Grouping of remote results follows this order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Equipment,
        ResourceKind::Material,
        ResourceKind::Operator,
        ResourceKind::Process,
    ];

    /// Path segment of the listing endpoint under `/api/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            ResourceKind::Equipment => "equipements",
            ResourceKind::Material => "materiaux",
            ResourceKind::Operator => "operateurs",
            ResourceKind::Process => "processus",
        }
    }

    /// Category label under which results of this kind are grouped.
    pub fn category(self) -> &'static str {
        match self {
            ResourceKind::Equipment => "Équipement",
            ResourceKind::Material => "Matériaux",
            ResourceKind::Operator => "Opérateurs",
            ResourceKind::Process => "Processus",
        }
    }

    /// Page the user lands on when selecting a record of this kind.
    pub fn listing_path(self) -> &'static str {
        match self {
            ResourceKind::Equipment => "/equipements",
            ResourceKind::Material => "/materiaux",
            ResourceKind::Operator => "/operateurs",
            ResourceKind::Process => "/processus",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ResourceKind::Equipment => "⚙",
            ResourceKind::Material => "▤",
            ResourceKind::Operator => "☺",
            ResourceKind::Process => "≡",
        }
    }

    /// Inverse of [`listing_path`](Self::listing_path).
    pub fn from_listing_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.listing_path() == path)
    }

    /// Parse a user-supplied kind name (CLI argument, command bar).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "equipment" | "equipements" | "equipement" => Some(ResourceKind::Equipment),
            "material" | "materials" | "materiaux" | "materiau" => Some(ResourceKind::Material),
            "operator" | "operators" | "operateurs" | "operateur" => Some(ResourceKind::Operator),
            "process" | "processes" | "processus" => Some(ResourceKind::Process),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Equipment => write!(f, "equipment"),
            ResourceKind::Material => write!(f, "material"),
            ResourceKind::Operator => write!(f, "operator"),
            ResourceKind::Process => write!(f, "process"),
        }
    }
}

/// What a [`SearchResult`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Page,
    Equipment,
    Material,
    Operator,
    Process,
}

impl From<ResourceKind> for ResultKind {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Equipment => ResultKind::Equipment,
            ResourceKind::Material => ResultKind::Material,
            ResourceKind::Operator => ResultKind::Operator,
            ResourceKind::Process => ResultKind::Process,
        }
    }
}

/// A normalised, display-ready search hit.
///
/// Built fresh on every search cycle from either a static catalog page or a
/// remote record; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub kind: ResultKind,
    pub display_name: String,
    pub description: String,
    /// Where selecting this result navigates to.
    pub navigation_path: String,
    pub icon: &'static str,
    pub category: String,
    /// The record as received from the API, for callers that need more than
    /// the projection. Always `None` for catalog pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_record: Option<serde_json::Value>,
}

/// Results sharing one category label, in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGroup {
    pub category: String,
    pub results: Vec<SearchResult>,
}

/// The grouped outcome of one search cycle.
///
/// Groups are ordered by the first occurrence of their category in the merged
/// sequence (catalog pages first, then remote kinds in issue order), so the
/// first result of the first group is also the first result of the merged
/// sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// The normalised query these results were computed for. Empty for the
    /// idle state.
    pub query: String,
    pub groups: Vec<ResultGroup>,
    /// Remote sources that failed during this cycle and contributed nothing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_sources: Vec<ResourceKind>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Group a merged result sequence by category, keeping first-occurrence
    /// order of categories and source order within each group.
    pub fn grouped(
        query: impl Into<String>,
        results: impl IntoIterator<Item = SearchResult>,
        failed_sources: Vec<ResourceKind>,
    ) -> Self {
        let mut groups: Vec<ResultGroup> = Vec::new();
        for result in results {
            match groups.iter_mut().find(|g| g.category == result.category) {
                Some(group) => group.results.push(result),
                None => groups.push(ResultGroup {
                    category: result.category.clone(),
                    results: vec![result],
                }),
            }
        }
        Self {
            query: query.into(),
            groups,
            failed_sources,
        }
    }

    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.results.is_empty())
    }

    /// The result selected by a keyboard confirm.
    pub fn first(&self) -> Option<&SearchResult> {
        self.iter().next()
    }

    /// All results in display (grouped) order.
    pub fn iter(&self) -> impl Iterator<Item = &SearchResult> {
        self.groups.iter().flat_map(|g| g.results.iter())
    }

    /// Result at a position in display order, as used by list highlights.
    pub fn get(&self, index: usize) -> Option<&SearchResult> {
        self.iter().nth(index)
    }

    pub fn group(&self, category: &str) -> Option<&ResultGroup> {
        self.groups.iter().find(|g| g.category == category)
    }
}

/// A navigation target produced by selecting a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
}

impl Navigation {
    pub fn to(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
