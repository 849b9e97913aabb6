//! Domain-specific assertion macros for mes harnesses.
//!
//! These add context-rich failure messages that show the whole grouped
//! result set when a search outcome is not what the harness expected.

/// Assert that a `ResultSet` has a group `category` containing a result
/// whose display name is `name`.
///
/// ```rust
/// assert_group_contains!(set, "Équipement", "Presse hydraulique");
/// ```
#[macro_export]
macro_rules! assert_group_contains {
    ($set:expr, $category:expr, $name:expr) => {{
        let set: &mes_core::ResultSet = &$set;
        let category: &str = $category;
        let name: &str = $name;
        match set.group(category) {
            Some(group) if group.results.iter().any(|r| r.display_name == name) => {}
            Some(group) => panic!(
                "assert_group_contains! failed: {:?} not in group {:?}.\n  Group holds: {:?}",
                name,
                category,
                group.results.iter().map(|r| &r.display_name).collect::<Vec<_>>()
            ),
            None => panic!(
                "assert_group_contains! failed: no group {:?}.\n  Groups: {:?}",
                category,
                set.groups.iter().map(|g| &g.category).collect::<Vec<_>>()
            ),
        }
    }};
}

/// Assert that no group is labelled `category`.
#[macro_export]
macro_rules! assert_no_group {
    ($set:expr, $category:expr) => {{
        let set: &mes_core::ResultSet = &$set;
        let category: &str = $category;
        if let Some(group) = set.group(category) {
            panic!(
                "assert_no_group! failed: group {:?} present with {:?}",
                category,
                group.results.iter().map(|r| &r.display_name).collect::<Vec<_>>()
            );
        }
    }};
}

/// Assert the display order of every result, across groups.
#[macro_export]
macro_rules! assert_result_names {
    ($set:expr, [$($name:expr),* $(,)?]) => {{
        let set: &mes_core::ResultSet = &$set;
        let actual: Vec<&str> = set.iter().map(|r| r.display_name.as_str()).collect();
        let expected: Vec<&str> = vec![$($name),*];
        if actual != expected {
            panic!(
                "assert_result_names! failed:\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            );
        }
    }};
}
