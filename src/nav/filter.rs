//! Live search and toggled filter over the items of a list view.
//!
//! Matching is always recomputed from the full source sequence, never by
//! narrowing the previous result, so deleting characters from the query
//! brings items back.

use crate::nav::model::{AppSummary, DeviceSummary, Entry, TableSchema};

/// Items that can be searched and narrowed by the per-view flag.
pub trait Filterable {
    /// Fields the free-text query is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Whether the item survives when the toggled filter flag is on.
    fn passes_flag(&self) -> bool;
}

impl Filterable for DeviceSummary {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.runtime.as_str(), self.state.label()]
    }

    fn passes_flag(&self) -> bool {
        self.is_booted()
    }
}

impl Filterable for AppSummary {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.bundle_id.as_str(),
            self.version.as_str(),
            self.device_name.as_str(),
        ]
    }

    fn passes_flag(&self) -> bool {
        self.data_path.is_some()
    }
}

impl Filterable for Entry {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn passes_flag(&self) -> bool {
        !self.is_hidden()
    }
}

impl Filterable for TableSchema {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn passes_flag(&self) -> bool {
        self.row_count > 0
    }
}

/// Query, flag and the ordered source indices that currently match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub flag: bool,
    pub matched: Vec<usize>,
}

impl FilterState {
    /// Empty query, flag off, every item visible.
    #[cfg(test)]
    pub fn identity(len: usize) -> Self {
        Self {
            query: String::new(),
            flag: false,
            matched: (0..len).collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty() || self.flag
    }

    pub fn len(&self) -> usize {
        self.matched.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Source index behind a displayed position.
    pub fn source_index(&self, position: usize) -> Option<usize> {
        self.matched.get(position).copied()
    }

    /// Recompute `matched` for `items`, returning the remapped cursor.
    pub fn apply<T: Filterable>(&mut self, items: &[T], cursor: Option<usize>) -> Option<usize> {
        let previous = cursor.and_then(|c| self.source_index(c));
        let flag = self.flag;
        self.matched = apply_query(items, &self.query, |item, needle| {
            (!flag || item.passes_flag()) && matches_fields(&item.search_fields(), needle)
        });
        remap_cursor(previous, cursor, &self.matched)
    }
}

/// Indices of `items` matching `query`, in source order.
///
/// `match_fn` receives the lowercased query; an empty query still goes
/// through `match_fn` so that composed predicates apply.
pub fn apply_query<T, F>(items: &[T], query: &str, match_fn: F) -> Vec<usize>
where
    F: Fn(&T, &str) -> bool,
{
    let needle = query.to_lowercase();
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| match_fn(item, &needle))
        .map(|(i, _)| i)
        .collect()
}

/// Case-insensitive substring match over any of `fields`.
pub fn matches_fields(fields: &[&str], needle_lower: &str) -> bool {
    needle_lower.is_empty()
        || fields
            .iter()
            .any(|f| f.to_lowercase().contains(needle_lower))
}

/// Keep the cursor on the same source item when it survives, otherwise
/// clamp its position into the new result. Empty results select nothing.
pub fn remap_cursor(
    previous_source: Option<usize>,
    previous_position: Option<usize>,
    matched: &[usize],
) -> Option<usize> {
    if matched.is_empty() {
        return None;
    }
    if let Some(src) = previous_source {
        if let Ok(pos) = matched.binary_search(&src) {
            return Some(pos);
        }
    }
    Some(previous_position.unwrap_or(0).min(matched.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::model::DeviceState;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn device(name: &str, runtime: &str, booted: bool) -> DeviceSummary {
        DeviceSummary {
            udid: format!("{name}-udid"),
            name: name.into(),
            runtime: runtime.into(),
            state: if booted {
                DeviceState::Booted
            } else {
                DeviceState::Shutdown
            },
            path: PathBuf::from("/devices").join(name),
        }
    }

    fn devices() -> Vec<DeviceSummary> {
        vec![
            device("iPhone 15", "iOS 17.2", true),
            device("iPad Air", "iOS 17.2", false),
            device("iPhone SE", "iOS 16.4", false),
            device("Apple Watch", "watchOS 10.2", true),
        ]
    }

    #[test]
    fn empty_query_is_identity() {
        let items = devices();
        let mut filter = FilterState::identity(items.len());
        filter.apply(&items, Some(0));
        assert_eq!(filter.matched, vec![0, 1, 2, 3]);
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let items = devices();
        let mut filter = FilterState::identity(items.len());
        filter.query = "IPHONE".into();
        filter.apply(&items, Some(0));
        assert_eq!(filter.matched, vec![0, 2]);
    }

    #[test]
    fn query_matches_secondary_fields() {
        let items = devices();
        let mut filter = FilterState::identity(items.len());
        filter.query = "16.4".into();
        filter.apply(&items, None);
        assert_eq!(filter.matched, vec![2]);
    }

    #[test]
    fn flag_intersects_with_query() {
        let items = devices();
        let mut filter = FilterState::identity(items.len());
        filter.flag = true;
        filter.apply(&items, None);
        assert_eq!(filter.matched, vec![0, 3]);
        filter.query = "iphone".into();
        filter.apply(&items, None);
        assert_eq!(filter.matched, vec![0]);
    }

    #[test]
    fn cursor_follows_source_item() {
        let items = devices();
        let mut filter = FilterState::identity(items.len());
        // Cursor on "iPhone SE" (source 2).
        filter.query = "iphone".into();
        let cursor = filter.apply(&items, Some(2));
        assert_eq!(cursor, Some(1));
        assert_eq!(filter.source_index(1), Some(2));
    }

    #[test]
    fn cursor_clamps_when_item_disappears() {
        let items = devices();
        let mut filter = FilterState::identity(items.len());
        filter.query = "watch".into();
        let cursor = filter.apply(&items, Some(1));
        assert_eq!(cursor, Some(0));
    }

    #[test]
    fn no_matches_clears_cursor() {
        let items = devices();
        let mut filter = FilterState::identity(items.len());
        filter.query = "android".into();
        let cursor = filter.apply(&items, Some(1));
        assert_eq!(cursor, None);
        assert!(filter.is_empty());
    }

    #[test]
    fn deleting_characters_restores_matches() {
        let items = devices();
        let mut filter = FilterState::identity(items.len());
        filter.query = "iphone s".into();
        filter.apply(&items, None);
        assert_eq!(filter.matched, vec![2]);
        filter.query = "iphone".into();
        filter.apply(&items, None);
        assert_eq!(filter.matched, vec![0, 2]);
    }

    #[test]
    fn entry_flag_hides_dotfiles() {
        let items = vec![
            Entry {
                name: ".DS_Store".into(),
                path: PathBuf::from("/a/.DS_Store"),
                is_dir: false,
                size: 0,
                modified: None,
            },
            Entry {
                name: "Documents".into(),
                path: PathBuf::from("/a/Documents"),
                is_dir: true,
                size: 0,
                modified: None,
            },
        ];
        let mut filter = FilterState::identity(items.len());
        filter.flag = true;
        filter.apply(&items, None);
        assert_eq!(filter.matched, vec![1]);
    }

    proptest! {
        /// Property: the result for q2 does not depend on q1 having been
        /// applied first.
        #[test]
        fn query_result_independent_of_previous_query(
            names in proptest::collection::vec("[a-cA-C ]{0,6}", 0..30),
            q1 in "[a-c]{0,3}",
            q2 in "[a-c]{0,3}",
        ) {
            let items: Vec<DeviceSummary> = names
                .iter()
                .map(|n| device(n, "iOS 17.0", false))
                .collect();

            let mut sequenced = FilterState::identity(items.len());
            sequenced.query = q1;
            sequenced.apply(&items, Some(0));
            sequenced.query = q2.clone();
            sequenced.apply(&items, Some(0));

            let mut fresh = FilterState::identity(items.len());
            fresh.query = q2;
            fresh.apply(&items, None);

            prop_assert_eq!(sequenced.matched, fresh.matched);
        }

        /// Property: a remapped cursor always points inside the result.
        #[test]
        fn remapped_cursor_in_bounds(
            matched in proptest::collection::btree_set(0usize..100, 0..40),
            prev_src in proptest::option::of(0usize..100),
            prev_pos in proptest::option::of(0usize..100),
        ) {
            let matched: Vec<usize> = matched.into_iter().collect();
            match remap_cursor(prev_src, prev_pos, &matched) {
                Some(c) => prop_assert!(c < matched.len()),
                None => prop_assert!(matched.is_empty()),
            }
        }
    }
}
