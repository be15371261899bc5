//! Schema construction errors.

use miette::Diagnostic;
use thiserror::Error;
use treeql_syntax::{OperationType, SyntaxError};

/// An error found while building a [`crate::Schema`] from SDL.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum SchemaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("type `{0}` is defined more than once")]
    #[diagnostic(code(treeql::schema::duplicate_type))]
    DuplicateType(String),

    #[error("unknown type `{name}` referenced by `{referenced_by}`")]
    #[diagnostic(code(treeql::schema::unknown_type))]
    UnknownType { name: String, referenced_by: String },

    #[error("cannot extend undefined type `{0}`")]
    #[diagnostic(code(treeql::schema::unknown_extension))]
    UnknownExtension(String),

    #[error("`{name}` is declared with `{found}`, it cannot be extended with `{expected}`")]
    #[diagnostic(code(treeql::schema::extension_kind))]
    ExtensionKindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{operation} root type `{name}` is not an object type")]
    #[diagnostic(code(treeql::schema::root_type))]
    InvalidRootType {
        operation: OperationType,
        name: String,
    },

    #[error("`{referenced_by}` must have an input type, found `{name}`")]
    #[diagnostic(code(treeql::schema::expected_input))]
    ExpectedInputType { name: String, referenced_by: String },

    #[error("`{referenced_by}` must have an output type, found `{name}`")]
    #[diagnostic(code(treeql::schema::expected_output))]
    ExpectedOutputType { name: String, referenced_by: String },
}
