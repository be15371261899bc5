//! Host-supplied hooks.
//!
//! Hooks are explicit configuration handed to the synthesizer and the tree
//! renderer. Each one is optional; an absent hook or a hook returning `None`
//! defers to the built-in behavior.

use std::fmt;

use serde::Serialize;
use treeql_schema::{FieldDefinition, InputValueDefinition, ScalarKind};
use treeql_syntax::Value;

use crate::ancestors::Ancestor;
use crate::path::TreePath;

/// Overrides the synthesized value of an argument or input field.
///
/// The ancestor path starts at the definition being synthesized.
pub type DefaultValueFn =
    dyn Fn(&InputValueDefinition, &Ancestor<'_>) -> Option<Value> + Send + Sync;

/// Replaces the built-in editor of a scalar or enum leaf.
pub type NodeCustomizerFn = dyn Fn(&NodeCustomizerParams<'_>) -> Option<CustomEditor> + Send + Sync;

/// Overrides a field's displayed description.
pub type DescriptionFn = dyn Fn(&FieldDefinition, &Ancestor<'_>) -> Option<String> + Send + Sync;

/// What kind of leaf an editor is needed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind<'a> {
    Scalar { name: &'a str, kind: ScalarKind },
    Enum { name: &'a str, values: Vec<&'a str> },
}

/// Everything a node customizer may inspect.
#[derive(Debug, Clone)]
pub struct NodeCustomizerParams<'a> {
    pub definition: &'a InputValueDefinition,
    pub path: &'a TreePath,
    pub input: InputKind<'a>,
    pub value: Option<&'a Value>,
}

/// A host-provided editor standing in for the built-in one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomEditor {
    pub widget: String,
}

impl CustomEditor {
    pub fn new(widget: impl Into<String>) -> Self {
        Self {
            widget: widget.into(),
        }
    }
}

/// The set of hooks consulted by the engine.
#[derive(Default)]
pub struct Hooks {
    default_value: Option<Box<DefaultValueFn>>,
    node: Option<Box<NodeCustomizerFn>>,
    description: Option<Box<DescriptionFn>>,
}

impl Hooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_value<F>(mut self, hook: F) -> Self
    where
        F: Fn(&InputValueDefinition, &Ancestor<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.default_value = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn with_node_customizer<F>(mut self, hook: F) -> Self
    where
        F: Fn(&NodeCustomizerParams<'_>) -> Option<CustomEditor> + Send + Sync + 'static,
    {
        self.node = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn with_description<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FieldDefinition, &Ancestor<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.description = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn default_value(
        &self,
        definition: &InputValueDefinition,
        path: &Ancestor<'_>,
    ) -> Option<Value> {
        self.default_value
            .as_ref()
            .and_then(|hook| hook(definition, path))
    }

    #[must_use]
    pub fn customize(&self, params: &NodeCustomizerParams<'_>) -> Option<CustomEditor> {
        self.node.as_ref().and_then(|hook| hook(params))
    }

    /// The description to display for a field, the schema's unless overridden.
    #[must_use]
    pub fn description(&self, field: &FieldDefinition, path: &Ancestor<'_>) -> Option<String> {
        self.description
            .as_ref()
            .and_then(|hook| hook(field, path))
            .or_else(|| field.description.clone())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("default_value", &self.default_value.is_some())
            .field("node", &self.node.is_some())
            .field("description", &self.description.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancestors::SchemaDefinition;
    use treeql_schema::TypeRef;

    #[test]
    fn test_absent_hooks_defer() {
        let hooks = Hooks::new();
        let mut field = FieldDefinition::new("user", TypeRef::named("User"));
        field.description = Some("A user".to_string());
        let path = Ancestor::root(SchemaDefinition::Field(&field));

        assert_eq!(hooks.description(&field, &path).as_deref(), Some("A user"));
        let id = InputValueDefinition::new("id", TypeRef::named("ID"));
        assert_eq!(hooks.default_value(&id, &path), None);
    }

    #[test]
    fn test_hooks_see_the_path() {
        let hooks = Hooks::new()
            .with_default_value(|definition, path| {
                (definition.name == "limit" && path.len() == 2).then(|| Value::int(25))
            })
            .with_description(|field, _| Some(format!("{} (custom)", field.name)));

        let field = FieldDefinition::new("users", TypeRef::named("User").list());
        let limit = InputValueDefinition::new("limit", TypeRef::named("Int"));
        let root = Ancestor::root(SchemaDefinition::Field(&field));
        let path = root.child(SchemaDefinition::Argument(&limit));

        assert_eq!(hooks.default_value(&limit, &path), Some(Value::int(25)));
        assert_eq!(hooks.default_value(&limit, &root), None);
        assert_eq!(
            hooks.description(&field, &root).as_deref(),
            Some("users (custom)")
        );
        assert_eq!(
            format!("{hooks:?}"),
            "Hooks { default_value: true, node: false, description: true }"
        );
    }
}
