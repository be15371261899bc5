//! Engine errors.

use thiserror::Error;
use treeql_syntax::{OperationType, SyntaxError};

/// A tree path that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tree path `{path}` at offset {offset}: {message}")]
pub struct PathError {
    pub path: String,
    pub offset: usize,
    pub message: String,
}

/// A tree edit the document cannot take.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("operation {0} does not exist")]
    UnknownOperation(usize),

    #[error("the schema has no {0} root type")]
    MissingRootType(OperationType),

    #[error("`{path}`: `{type_name}` has no field `{name}`")]
    UnknownField {
        path: String,
        type_name: String,
        name: String,
    },

    #[error("`{path}`: `{type_name}` is not a possible type here")]
    UnknownFragment { path: String, type_name: String },

    #[error("`{path}`: `{field}` has no argument `{name}`")]
    UnknownArgument {
        path: String,
        field: String,
        name: String,
    },

    #[error("`{path}`: `{type_name}` has no input field `{name}`")]
    UnknownInputField {
        path: String,
        type_name: String,
        name: String,
    },

    #[error("`{0}` is required and cannot be deselected")]
    Required(String),

    #[error("`{0}` cannot be toggled")]
    NotToggleable(String),

    #[error("`{0}` has no value editor")]
    NotEditable(String),

    #[error("`{0}` is not a list")]
    NotAList(String),

    #[error("`{path}` has no row {index}")]
    RowOutOfRange { path: String, index: usize },

    #[error("`{0}` does not address a node of this document")]
    InvalidPath(String),
}

/// An error reported by the document editor.
#[derive(Debug, Clone, Error)]
pub enum EditorError {
    #[error("no schema is attached")]
    NoSchema,

    #[error(transparent)]
    Edit(#[from] EditError),

    /// The edited document prints into text that does not parse.
    #[error("edited document is not valid GraphQL: {0}")]
    InvalidDocument(#[source] SyntaxError),
}
