//! AST synchronization engine for treeql.
//!
//! Keeps a GraphQL document, its formatted text and a schema-driven tree view
//! in sync:
//! - `synthesize`: minimal valid arguments, selections and default queries
//! - `merge`: structural `(prev, next)` merges over the persistent AST
//! - `source`: change detection by source text
//! - `tree`: the tree view, memoized per field
//! - `edit`: path-addressed tree edits
//! - `editor`: the document editor tying text and tree together
//!
//! Schema, hooks and configuration are passed down explicitly through a
//! [`Context`].

pub mod ancestors;
pub mod config;
pub mod context;
pub mod edit;
pub mod editor;
pub mod error;
pub mod hooks;
pub mod merge;
pub mod order;
pub mod path;
pub mod source;
pub mod synthesize;
pub mod tree;

pub use ancestors::{Ancestor, SchemaDefinition};
pub use config::{EditorConfig, DEFAULT_MAX_DEPTH};
pub use context::Context;
pub use edit::{apply_edit, TreeEdit};
pub use editor::{DocumentEditor, Listener};
pub use error::{EditError, EditorError, PathError};
pub use hooks::{CustomEditor, Hooks, InputKind, NodeCustomizerParams};
pub use path::{PathSegment, TreePath};
pub use source::same_source;
pub use synthesize::{synthesize_operation, Synthesizer, TYPENAME_FIELD};
pub use tree::{Editor, NodeKind, OperationView, TreeNode, TreeRenderer, TreeView};
