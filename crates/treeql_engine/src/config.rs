//! Editor configuration.

use serde::{Deserialize, Serialize};
use treeql_schema::ScalarKinds;
use treeql_syntax::{FormatOptions, OperationType};

/// Default bound on synthesis recursion.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Configuration of a [`crate::DocumentEditor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Root field to synthesize a query for when none is supplied.
    pub default_field: Option<String>,
    /// Operation type of the synthesized query.
    pub default_operation: OperationType,
    pub scalars: ScalarKinds,
    /// Synthesis stops descending past this many nested input values.
    pub max_depth: usize,
    pub format: FormatOptions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_field: None,
            default_operation: OperationType::Query,
            scalars: ScalarKinds::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            format: FormatOptions::default(),
        }
    }
}

impl EditorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_field(mut self, field: impl Into<String>, operation: OperationType) -> Self {
        self.default_field = Some(field.into());
        self.default_operation = operation;
        self
    }

    #[must_use]
    pub fn with_scalars(mut self, scalars: ScalarKinds) -> Self {
        self.scalars = scalars;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.default_field, None);
        assert_eq!(config.default_operation, OperationType::Query);
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.format.max_width, 80);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: EditorConfig = serde_json::from_str(
            r#"{
                "defaultField": "signUp",
                "defaultOperation": "mutation",
                "scalars": { "int": ["Int", "Cents"] },
                "format": { "indentSize": 4 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_field.as_deref(), Some("signUp"));
        assert_eq!(config.default_operation, OperationType::Mutation);
        assert!(config.scalars.is_numeric("Cents"));
        assert!(!config.scalars.is_numeric("Long"));
        assert_eq!(config.scalars.boolean, ["Boolean"]);
        assert_eq!(config.format.indent_size, 4);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }
}
