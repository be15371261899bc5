//! Change detection by source text.

use treeql_syntax::Located;

/// Returns true if both nodes were parsed from identical source text.
///
/// A node without a location has no source text and is never the same as
/// anything, so freshly synthesized or rebuilt nodes always count as changed.
pub fn same_source<T: Located + ?Sized>(prev: &T, next: &T) -> bool {
    match (prev.source_text(), next.source_text()) {
        (Some(prev), Some(next)) => prev.len() == next.len() && prev == next,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treeql_syntax::{parse_document, Field, Selection};

    fn first_field(source: &str) -> Selection {
        let document = parse_document(source).unwrap();
        let operation = document.operation(0).unwrap();
        operation.selection_set.selections[0].clone()
    }

    #[test]
    fn test_same_text_in_different_documents() {
        let a = first_field("{ user(id: 1) { name } }");
        let b = first_field("query Named {\n  user(id: 1) { name }\n}");
        assert!(same_source(&a, &b));
    }

    #[test]
    fn test_changed_text() {
        let a = first_field("{ user(id: 1) { name } }");
        let b = first_field("{ user(id: 2) { name } }");
        assert!(!same_source(&a, &b));
    }

    #[test]
    fn test_missing_location_is_always_different() {
        let parsed = first_field("{ id }");
        let built = Selection::from(Field::new("id"));
        assert_eq!(parsed, built);
        assert!(!same_source(&parsed, &built));
        assert!(!same_source(&built, &built));
    }
}
