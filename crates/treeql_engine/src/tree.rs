//! The tree view of a document.
//!
//! [`TreeRenderer`] walks the schema and the document together and produces a
//! [`TreeView`]: one node per field, implementation fragment, argument, input
//! field and list row, each carrying the [`TreePath`] that edits address it by.
//! Composite fields expand only when selected, so the walk is bounded by the
//! document rather than the (possibly self-referential) schema.

use std::mem;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::trace;
use treeql_schema::{
    FieldDefinition, InputValueDefinition, ObjectType, ScalarKind, TypeDefinition, TypeRef,
};
use treeql_syntax::{Argument, Document, Field, OperationDefinition, OperationType, SelectionSet, Value};

use crate::ancestors::{Ancestor, SchemaDefinition};
use crate::context::Context;
use crate::hooks::{CustomEditor, InputKind, NodeCustomizerParams};
use crate::order::compare_names;
use crate::path::TreePath;
use crate::source::same_source;

/// What a tree node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Field,
    Fragment,
    Argument,
    InputField,
    Row,
    /// A type shape the tree cannot show.
    Unhandled,
}

/// The editor of a leaf value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Editor {
    Scalar { kind: ScalarKind, value: String },
    Enum { values: Vec<String>, value: Option<String> },
    Custom(CustomEditor),
}

/// One node of the tree view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub kind: NodeKind,
    pub name: String,
    pub type_name: String,
    pub description: Option<String>,
    pub path: TreePath,
    pub depth: usize,
    pub selected: bool,
    pub toggleable: bool,
    pub editor: Option<Editor>,
    /// A list row that may be removed.
    pub removable: bool,
    /// A list that rows may be appended to.
    pub appendable: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(
        kind: NodeKind,
        name: impl Into<String>,
        type_name: impl Into<String>,
        path: TreePath,
        depth: usize,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            type_name: type_name.into(),
            description: None,
            path,
            depth,
            selected: false,
            toggleable: false,
            editor: None,
            removable: false,
            appendable: false,
            children: Vec::new(),
        }
    }

    fn unhandled(type_name: &str, path: TreePath, depth: usize) -> Self {
        Self::new(NodeKind::Unhandled, type_name, type_name, path, depth)
    }

    /// The node at `path` in this subtree.
    #[must_use]
    pub fn find(&self, path: &TreePath) -> Option<&Self> {
        if self.kind != NodeKind::Unhandled && &self.path == path {
            return Some(self);
        }
        find_in(&self.children, path)
    }
}

fn find_in<'a>(nodes: &'a [TreeNode], path: &TreePath) -> Option<&'a TreeNode> {
    nodes.iter().find_map(|node| node.find(path))
}

/// One operation of the tree view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationView {
    pub index: usize,
    pub name: Option<String>,
    pub operation_type: OperationType,
    pub root_type: Option<String>,
    pub children: Vec<TreeNode>,
}

/// The tree view of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeView {
    pub operations: Vec<OperationView>,
}

impl TreeView {
    /// The node at `path`.
    #[must_use]
    pub fn find(&self, path: &TreePath) -> Option<&TreeNode> {
        let operation = self.operations.get(path.operation)?;
        find_in(&operation.children, path)
    }
}

#[derive(Debug)]
struct CachedField {
    selection: Arc<Field>,
    node: TreeNode,
}

/// Renders tree views, reusing field subtrees whose source text is unchanged.
#[derive(Debug, Default)]
pub struct TreeRenderer {
    cache: FxHashMap<TreePath, CachedField>,
    hits: usize,
}

impl TreeRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every memoized subtree.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of field subtrees reused so far.
    #[must_use]
    pub const fn cache_hits(&self) -> usize {
        self.hits
    }

    pub fn render(&mut self, cx: Context<'_>, document: &Document) -> TreeView {
        let mut pass = RenderPass {
            cx,
            previous: mem::take(&mut self.cache),
            cache: FxHashMap::default(),
            hits: 0,
        };
        let operations = document
            .operations()
            .enumerate()
            .map(|(index, operation)| pass.operation(index, operation))
            .collect();
        trace!(reused = pass.hits, "rendered tree");
        self.cache = pass.cache;
        self.hits += pass.hits;
        TreeView { operations }
    }
}

struct RenderPass<'a> {
    cx: Context<'a>,
    previous: FxHashMap<TreePath, CachedField>,
    cache: FxHashMap<TreePath, CachedField>,
    hits: usize,
}

impl RenderPass<'_> {
    fn operation(&mut self, index: usize, operation: &OperationDefinition) -> OperationView {
        let path = TreePath::new(index);
        let root = self.cx.schema.root_type(operation.operation);
        let children = match root {
            Some(root) => {
                self.object_fields(root, Some(operation.selection_set.as_ref()), &path, 0, None)
            }
            None => vec![TreeNode::unhandled(operation.operation.as_str(), path, 0)],
        };
        OperationView {
            index,
            name: operation.name.as_ref().map(|name| name.value.clone()),
            operation_type: operation.operation,
            root_type: root.map(|root| root.name.clone()),
            children,
        }
    }

    /// Moves the memo entries below a reused field into the new cache.
    fn keep_descendants(&mut self, path: &TreePath) {
        let descendants: Vec<TreePath> = self
            .previous
            .keys()
            .filter(|key| key.starts_with(path))
            .cloned()
            .collect();
        for key in descendants {
            if let Some(entry) = self.previous.remove(&key) {
                self.cache.insert(key, entry);
            }
        }
    }

    fn type_children(
        &mut self,
        definition: &TypeDefinition,
        set: Option<&SelectionSet>,
        path: &TreePath,
        depth: usize,
        ancestors: Option<&Ancestor<'_>>,
    ) -> Vec<TreeNode> {
        match definition {
            TypeDefinition::Object(object) => self.object_fields(object, set, path, depth, ancestors),
            TypeDefinition::Interface(interface) => {
                let mut nodes = self.fields(interface.fields.values(), set, path, depth, ancestors);
                let mut implementations = self.cx.schema.possible_types(&interface.name);
                implementations.sort_by(|a, b| compare_names(&a.name, &b.name));
                for object in implementations {
                    nodes.push(self.fragment(object, set, path, depth, ancestors));
                }
                nodes
            }
            other => vec![TreeNode::unhandled(other.name(), path.clone(), depth)],
        }
    }

    fn object_fields(
        &mut self,
        object: &ObjectType,
        set: Option<&SelectionSet>,
        path: &TreePath,
        depth: usize,
        ancestors: Option<&Ancestor<'_>>,
    ) -> Vec<TreeNode> {
        self.fields(object.fields.values(), set, path, depth, ancestors)
    }

    fn fields<'f>(
        &mut self,
        definitions: impl Iterator<Item = &'f FieldDefinition>,
        set: Option<&SelectionSet>,
        path: &TreePath,
        depth: usize,
        ancestors: Option<&Ancestor<'_>>,
    ) -> Vec<TreeNode> {
        let mut definitions: Vec<_> = definitions.collect();
        definitions.sort_by(|a, b| compare_names(&a.name, &b.name));
        definitions
            .into_iter()
            .map(|definition| {
                let selection = set.and_then(|set| set.field(&definition.name));
                self.field(definition, selection, path, depth, ancestors)
            })
            .collect()
    }

    fn fragment(
        &mut self,
        object: &ObjectType,
        set: Option<&SelectionSet>,
        parent: &TreePath,
        depth: usize,
        ancestors: Option<&Ancestor<'_>>,
    ) -> TreeNode {
        let path = parent.fragment(&object.name);
        let fragment = set.and_then(|set| set.inline_fragment(&object.name));
        let mut node = TreeNode::new(NodeKind::Fragment, &object.name, &object.name, path, depth);
        node.description = object.description.clone();
        node.selected = fragment.is_some();
        node.toggleable = true;
        if let Some(fragment) = fragment {
            node.children = self.object_fields(
                object,
                Some(fragment.selection_set.as_ref()),
                &node.path,
                depth + 1,
                ancestors,
            );
        }
        node
    }

    fn field(
        &mut self,
        definition: &FieldDefinition,
        selection: Option<&Arc<Field>>,
        parent: &TreePath,
        depth: usize,
        ancestors: Option<&Ancestor<'_>>,
    ) -> TreeNode {
        let path = parent.field(&definition.name);

        if let Some(field) = selection {
            if let Some(cached) = self.previous.remove(&path) {
                if same_source(&cached.selection, field) {
                    self.hits += 1;
                    let node = cached.node.clone();
                    self.keep_descendants(&path);
                    self.cache.insert(path, cached);
                    return node;
                }
            }
        }

        let ancestor = Ancestor::extend(ancestors, SchemaDefinition::Field(definition));
        let mut node = TreeNode::new(
            NodeKind::Field,
            &definition.name,
            definition.ty.to_string(),
            path,
            depth,
        );
        node.description = self.cx.hooks.description(definition, &ancestor);
        node.toggleable = true;

        let Some(field) = selection else {
            return node;
        };
        node.selected = true;

        let mut arguments: Vec<_> = definition.arguments.iter().collect();
        arguments.sort_by(|a, b| compare_names(&a.name, &b.name));
        for argument in arguments {
            let child = self.argument(argument, field.argument(&argument.name), &node.path, depth + 1, &ancestor);
            node.children.push(child);
        }

        match self.cx.schema.unwrap_type(&definition.ty) {
            Some(ty) if ty.is_composite() => {
                let children = self.type_children(
                    ty,
                    field.selection_set.as_deref(),
                    &node.path,
                    depth + 1,
                    Some(&ancestor),
                );
                node.children.extend(children);
            }
            Some(_) => {}
            None => node.children.push(TreeNode::unhandled(
                definition.ty.named_type(),
                node.path.clone(),
                depth + 1,
            )),
        }

        if field.loc.is_some() {
            self.cache.insert(
                node.path.clone(),
                CachedField {
                    selection: Arc::clone(field),
                    node: node.clone(),
                },
            );
        }
        node
    }

    fn argument(
        &mut self,
        definition: &InputValueDefinition,
        argument: Option<&Arc<Argument>>,
        parent: &TreePath,
        depth: usize,
        ancestor: &Ancestor<'_>,
    ) -> TreeNode {
        let path = parent.argument(&definition.name);
        let ancestor = ancestor.child(SchemaDefinition::Argument(definition));
        let value = argument.map(|argument| &argument.value);
        self.input(NodeKind::Argument, definition, value, path, depth, &ancestor)
    }

    fn input(
        &mut self,
        kind: NodeKind,
        definition: &InputValueDefinition,
        value: Option<&Value>,
        path: TreePath,
        depth: usize,
        ancestor: &Ancestor<'_>,
    ) -> TreeNode {
        let required = definition.is_required();
        let mut node = TreeNode::new(kind, &definition.name, definition.ty.to_string(), path, depth);
        node.description = definition.description.clone();
        node.selected = required || value.is_some();
        node.toggleable = !required;
        if node.selected {
            self.fill_value(&mut node, definition, &definition.ty, value, ancestor);
        }
        node
    }

    /// Adds the rows, input fields or editor for a value of type `ty`.
    fn fill_value(
        &mut self,
        node: &mut TreeNode,
        definition: &InputValueDefinition,
        ty: &TypeRef,
        value: Option<&Value>,
        ancestor: &Ancestor<'_>,
    ) {
        if let Some(item_type) = ty.item_type() {
            node.appendable = true;
            let rows: Vec<&Value> = match value {
                Some(Value::List(list)) => list.values.iter().collect(),
                Some(Value::Null(_)) | None => Vec::new(),
                Some(single) => vec![single],
            };
            for (index, row) in rows.into_iter().enumerate() {
                let mut child = TreeNode::new(
                    NodeKind::Row,
                    format!("[{index}]"),
                    item_type.to_string(),
                    node.path.row(index),
                    node.depth + 1,
                );
                child.selected = true;
                child.removable = index > 0;
                self.fill_value(&mut child, definition, item_type, Some(row), ancestor);
                node.children.push(child);
            }
            return;
        }

        match self.cx.schema.unwrap_type(ty) {
            Some(input_type @ TypeDefinition::InputObject(input)) => {
                let ancestor = ancestor.child(SchemaDefinition::Type(input_type));
                let object = value.and_then(Value::as_object);
                let mut fields: Vec<_> = input.fields.values().collect();
                fields.sort_by(|a, b| compare_names(&a.name, &b.name));
                for field in fields {
                    let ancestor = ancestor.child(SchemaDefinition::InputField(field));
                    let field_value = object
                        .and_then(|object| object.field(&field.name))
                        .map(|field| &field.value);
                    let child = self.input(
                        NodeKind::InputField,
                        field,
                        field_value,
                        node.path.input_field(&field.name),
                        node.depth + 1,
                        &ancestor,
                    );
                    node.children.push(child);
                }
            }
            Some(TypeDefinition::Scalar(scalar)) => {
                let input = InputKind::Scalar {
                    name: &scalar.name,
                    kind: self.cx.scalars.classify(&scalar.name),
                };
                node.editor = Some(self.editor(definition, &node.path, input, value));
            }
            Some(TypeDefinition::Enum(enumeration)) => {
                let input = InputKind::Enum {
                    name: &enumeration.name,
                    values: enumeration.value_names().collect(),
                };
                node.editor = Some(self.editor(definition, &node.path, input, value));
            }
            _ => node.children.push(TreeNode::unhandled(
                ty.named_type(),
                node.path.clone(),
                node.depth + 1,
            )),
        }
    }

    fn editor(
        &self,
        definition: &InputValueDefinition,
        path: &TreePath,
        input: InputKind<'_>,
        value: Option<&Value>,
    ) -> Editor {
        let params = NodeCustomizerParams {
            definition,
            path,
            input,
            value,
        };
        if let Some(custom) = self.cx.hooks.customize(&params) {
            return Editor::Custom(custom);
        }
        match params.input {
            InputKind::Scalar { kind, .. } => Editor::Scalar {
                kind,
                value: value.map(value_text).unwrap_or_default(),
            },
            InputKind::Enum { values, .. } => Editor::Enum {
                values: values.into_iter().map(str::to_string).collect(),
                value: match value {
                    Some(Value::Enum(value)) => Some(value.value.clone()),
                    _ => None,
                },
            },
        }
    }
}

/// The text a built-in editor shows for a leaf value.
fn value_text(value: &Value) -> String {
    match value {
        Value::Int(v) => v.value.clone(),
        Value::Float(v) => v.value.clone(),
        Value::String(v) => v.value.clone(),
        Value::Enum(v) => v.value.clone(),
        Value::Boolean(v) => v.value.to_string(),
        Value::Variable(v) => format!("${}", v.name),
        Value::Null(_) | Value::List(_) | Value::Object(_) => String::new(),
    }
}
