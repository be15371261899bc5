//! Canonical ordering of sibling collections.
//!
//! Fields, arguments and input fields sort by name, case-insensitively, with a
//! field literally named `id` pinned first. Inline fragments follow all fields,
//! ordered by type condition, and fragment spreads come last.

use std::cmp::Ordering;
use std::sync::Arc;

use treeql_syntax::{Argument, ObjectField, Selection};

/// The name pinned to the front of every sibling collection.
pub const PINNED_NAME: &str = "id";

/// Compares two sibling names.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    match (a == PINNED_NAME, b == PINNED_NAME) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase))
            .then_with(|| a.cmp(b)),
    }
}

/// Which group of a sibling collection an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Group {
    Field,
    InlineFragment,
    FragmentSpread,
}

/// A sibling entry addressed by a key: its group plus its name.
pub trait Keyed {
    fn key(&self) -> (Group, &str);

    /// Identity of the underlying node.
    fn same(&self, other: &Self) -> bool;
}

impl Keyed for Arc<Argument> {
    fn key(&self) -> (Group, &str) {
        (Group::Field, &self.name.value)
    }

    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl Keyed for Arc<ObjectField> {
    fn key(&self) -> (Group, &str) {
        (Group::Field, &self.name.value)
    }

    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl Keyed for Selection {
    fn key(&self) -> (Group, &str) {
        match self {
            Self::Field(field) => (Group::Field, &field.name.value),
            Self::InlineFragment(fragment) => (
                Group::InlineFragment,
                fragment.type_condition.as_ref().map_or("", |name| name.as_str()),
            ),
            Self::FragmentSpread(spread) => (Group::FragmentSpread, &spread.name.value),
        }
    }

    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Compares two keyed entries canonically.
pub fn compare<T: Keyed>(a: &T, b: &T) -> Ordering {
    let (a_group, a_name) = a.key();
    let (b_group, b_name) = b.key();
    a_group
        .cmp(&b_group)
        .then_with(|| compare_names(a_name, b_name))
}

/// Sorts entries canonically. The sort is stable.
pub fn sort<T: Keyed>(entries: &mut [T]) {
    entries.sort_by(compare);
}

/// Returns true if entries are in canonical order.
pub fn is_sorted<T: Keyed>(entries: &[T]) -> bool {
    entries
        .windows(2)
        .all(|pair| compare(&pair[0], &pair[1]) != Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treeql_syntax::{Field, InlineFragment, SelectionSet, Value};

    #[test]
    fn test_id_is_pinned_first() {
        let mut names = vec!["name", "ID", "id", "age", "Zone"];
        names.sort_by(|a, b| compare_names(a, b));
        assert_eq!(names, ["id", "age", "ID", "name", "Zone"]);
    }

    #[test]
    fn test_case_insensitive_with_stable_tiebreak() {
        assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_names("B", "b"), Ordering::Less);
        assert_eq!(compare_names("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_fragments_sort_after_fields() {
        let mut selections = vec![
            Selection::from(InlineFragment::new("User", SelectionSet::default())),
            Selection::from(Field::new("name")),
            Selection::from(InlineFragment::new("Org", SelectionSet::default())),
            Selection::from(Field::new("id")),
        ];
        sort(&mut selections);

        let keys: Vec<_> = selections.iter().map(|s| s.key().1.to_string()).collect();
        assert_eq!(keys, ["id", "name", "Org", "User"]);
        assert!(is_sorted(&selections));
    }

    #[test]
    fn test_arguments_sort() {
        let mut arguments = vec![
            Arc::new(Argument::new("limit", Value::int(0))),
            Arc::new(Argument::new("id", Value::string(""))),
            Arc::new(Argument::new("after", Value::null())),
        ];
        assert!(!is_sorted(&arguments));
        sort(&mut arguments);
        let names: Vec<_> = arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["id", "after", "limit"]);
    }
}
