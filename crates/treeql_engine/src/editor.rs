//! The document editor: one document, two views.
//!
//! [`DocumentEditor`] owns the document and its formatted text and keeps them
//! consistent. Tree edits are merged into the document and published as text;
//! text edits are parsed back into the document. Only tree edits reach the
//! subscribers, since text edits come from them.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use treeql_schema::Schema;
use treeql_syntax::{format, parse_document, print, Document, OperationDefinition};

use crate::config::EditorConfig;
use crate::context::Context;
use crate::edit::{apply_edit, TreeEdit};
use crate::error::{EditError, EditorError};
use crate::hooks::Hooks;
use crate::merge::merge_operation_into_document;
use crate::synthesize::synthesize_operation;
use crate::tree::{TreeRenderer, TreeView};

/// Receives every newly published query text.
pub type Listener = Box<dyn FnMut(&str) + Send>;

pub struct DocumentEditor {
    config: EditorConfig,
    hooks: Hooks,
    schema: Option<Arc<Schema>>,
    document: Arc<Document>,
    text: String,
    listeners: Vec<Listener>,
    renderer: TreeRenderer,
    /// Set once the document no longer needs a synthesized default.
    initialized: bool,
}

impl DocumentEditor {
    #[must_use]
    pub fn new(config: EditorConfig, hooks: Hooks) -> Self {
        Self {
            config,
            hooks,
            schema: None,
            document: Arc::default(),
            text: String::new(),
            listeners: Vec::new(),
            renderer: TreeRenderer::new(),
            initialized: false,
        }
    }

    /// Starts from a supplied query instead of a synthesized one.
    ///
    /// Text that does not parse is kept as the text view; the document stays
    /// empty until the text is fixed.
    #[must_use]
    pub fn with_query(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        match parse_document(&text) {
            Ok(document) => self.document = Arc::new(document),
            Err(err) => debug!(%err, "initial query does not parse"),
        }
        self.text = text;
        self.initialized = true;
        self
    }

    /// Attaches a schema.
    ///
    /// The first schema triggers synthesis of the default query when no query
    /// was supplied and a default field is configured.
    pub fn set_schema(&mut self, schema: impl Into<Arc<Schema>>) {
        let schema = schema.into();
        info!(types = schema.types().count(), "schema attached");
        self.schema = Some(Arc::clone(&schema));
        self.renderer.clear();

        if self.initialized {
            return;
        }
        let Some(field) = self.config.default_field.as_deref() else {
            return;
        };
        let operation = self.config.default_operation;
        let cx = Context::from_config(&schema, &self.hooks, &self.config);
        let text = synthesize_operation(cx, field, operation, &self.config.format);
        if text.is_empty() {
            warn!(field, %operation, "default field not found on the schema");
            return;
        }

        info!(field, %operation, "synthesized default query");
        match parse_document(&text) {
            Ok(document) => self.document = Arc::new(document),
            Err(err) => error!(%err, "synthesized query does not parse"),
        }
        self.initialized = true;
        self.publish(text);
    }

    /// Registers a listener for published query text.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Renders the tree view, `None` while no schema is attached.
    pub fn tree(&mut self) -> Option<TreeView> {
        let schema = self.schema.as_deref()?;
        let cx = Context::from_config(schema, &self.hooks, &self.config);
        Some(self.renderer.render(cx, &self.document))
    }

    /// Applies a tree edit and commits the result.
    ///
    /// Returns whether new text was published.
    pub fn apply(&mut self, edit: &TreeEdit) -> Result<bool, EditorError> {
        let schema = self.schema.clone().ok_or(EditorError::NoSchema)?;
        let index = edit.operation();
        let prev = self
            .document
            .operation(index)
            .cloned()
            .ok_or(EditError::UnknownOperation(index))?;

        let cx = Context::from_config(&schema, &self.hooks, &self.config);
        let next = apply_edit(cx, &prev, edit).map_err(|err| {
            warn!(%err, "tree edit rejected");
            err
        })?;
        self.on_tree_edit(&prev, &next)
    }

    /// Replaces operation `prev` with `next`, then prints, formats and
    /// publishes the document when its text changed.
    ///
    /// A document that formats into invalid GraphQL is not committed.
    pub fn on_tree_edit(
        &mut self,
        prev: &Arc<OperationDefinition>,
        next: &Arc<OperationDefinition>,
    ) -> Result<bool, EditorError> {
        let document = merge_operation_into_document(&self.document, Some(prev), Some(next));
        if Arc::ptr_eq(&document, &self.document) {
            return Ok(false);
        }

        let text = format(&print(&document), &self.config.format).map_err(|err| {
            error!(%err, "edited document is not valid GraphQL");
            EditorError::InvalidDocument(err)
        })?;
        self.document = document;
        Ok(self.publish(text))
    }

    /// Takes text edited outside the tree.
    ///
    /// Text that does not parse is ignored, keeping the last valid document.
    /// Returns whether the document was replaced.
    pub fn on_text_edit(&mut self, text: &str) -> bool {
        if text == self.text {
            debug!("text unchanged");
            return false;
        }
        let document = match parse_document(text) {
            Ok(document) => document,
            Err(err) => {
                debug!(%err, "ignoring text that does not parse");
                return false;
            }
        };

        self.text = text.to_string();
        if document == *self.document {
            debug!("text edit leaves the document unchanged");
            return false;
        }
        self.document = Arc::new(document);
        true
    }

    #[must_use]
    pub const fn document(&self) -> &Arc<Document> {
        &self.document
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub const fn renderer(&self) -> &TreeRenderer {
        &self.renderer
    }

    fn publish(&mut self, text: String) -> bool {
        if text == self.text {
            return false;
        }
        self.text = text;
        for listener in &mut self.listeners {
            listener(&self.text);
        }
        true
    }
}

impl fmt::Debug for DocumentEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentEditor")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .field("schema", &self.schema.is_some())
            .field("text", &self.text)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::TreePath;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use treeql_syntax::OperationType;

    const SDL: &str = r#"
        type Query { user(id: ID!, limit: Int): User ping: Boolean }
        type User { id: ID! name: String }
    "#;

    fn schema() -> Schema {
        Schema::parse(SDL).unwrap()
    }

    fn recorded(editor: &mut DocumentEditor) -> Arc<Mutex<Vec<String>>> {
        let published = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&published);
        editor.subscribe(move |text| sink.lock().unwrap().push(text.to_string()));
        published
    }

    fn toggle(path: &str) -> TreeEdit {
        TreeEdit::Toggle(path.parse::<TreePath>().unwrap())
    }

    #[test]
    fn test_default_query_on_schema() {
        let config = EditorConfig::new().with_default_field("user", OperationType::Query);
        let mut editor = DocumentEditor::new(config, Hooks::new());
        let published = recorded(&mut editor);
        assert!(editor.tree().is_none());

        editor.set_schema(schema());
        let expected = "query user {\n  user(id: \"\") {\n    __typename\n  }\n}\n";
        assert_eq!(editor.text(), expected);
        assert_eq!(*published.lock().unwrap(), [expected.to_string()]);
        assert!(editor.tree().is_some());

        // later schemas do not resynthesize
        editor.set_schema(schema());
        assert_eq!(published.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_supplied_query_wins() {
        let config = EditorConfig::new().with_default_field("user", OperationType::Query);
        let mut editor = DocumentEditor::new(config, Hooks::new()).with_query("{ ping }");
        editor.set_schema(schema());
        assert_eq!(editor.text(), "{ ping }");
    }

    #[test]
    fn test_apply_publishes_changed_text() {
        let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
            .with_query("query Q { user(id: \"1\") { id } }");
        let published = recorded(&mut editor);
        editor.set_schema(schema());

        assert!(editor.apply(&toggle("user.name")).unwrap());
        assert_eq!(
            editor.text(),
            "query Q {\n  user(id: \"1\") {\n    id\n    name\n  }\n}\n"
        );
        assert_eq!(published.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_apply_errors() {
        let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
            .with_query("query Q { user(id: \"1\") { id } }");
        assert!(matches!(editor.apply(&toggle("ping")), Err(EditorError::NoSchema)));

        editor.set_schema(schema());
        assert!(matches!(
            editor.apply(&toggle("1:ping")),
            Err(EditorError::Edit(EditError::UnknownOperation(1)))
        ));
        assert!(matches!(
            editor.apply(&toggle("user(id)")),
            Err(EditorError::Edit(EditError::Required(_)))
        ));
    }

    #[test]
    fn test_invalid_rename_is_not_committed() {
        let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
            .with_query("query Q { ping }");
        let published = recorded(&mut editor);
        editor.set_schema(schema());
        let before = Arc::clone(editor.document());

        let rename = TreeEdit::RenameOperation {
            operation: 0,
            name: "123".to_string(),
        };
        assert!(matches!(
            editor.apply(&rename),
            Err(EditorError::InvalidDocument(_))
        ));
        assert!(Arc::ptr_eq(editor.document(), &before));
        assert_eq!(editor.text(), "query Q { ping }");
        assert!(published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_text_edits() {
        let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
            .with_query("query Q { ping }");
        let published = recorded(&mut editor);
        let before = Arc::clone(editor.document());

        assert!(!editor.on_text_edit("query Q { ping }"));
        assert!(!editor.on_text_edit("query Q { ping "));
        assert!(Arc::ptr_eq(editor.document(), &before));

        // layout only
        assert!(!editor.on_text_edit("query Q {\n  ping\n}\n"));
        assert!(Arc::ptr_eq(editor.document(), &before));

        assert!(editor.on_text_edit("query Q { ping user(id: \"2\") { id } }"));
        assert_eq!(editor.document().operation(0).unwrap().selection_set.selections.len(), 2);
        assert!(published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unchanged_edit_is_quiet() {
        let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
            .with_query("query Q { user(id: \"1\", limit: 5) { id } }");
        let published = recorded(&mut editor);
        editor.set_schema(schema());

        let edit = TreeEdit::Input {
            path: "user(limit)".parse().unwrap(),
            text: "5".to_string(),
        };
        assert!(!editor.apply(&edit).unwrap());
        assert!(published.lock().unwrap().is_empty());
    }
}
