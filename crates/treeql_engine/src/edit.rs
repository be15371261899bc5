//! Tree edits and their application to an operation.
//!
//! An edit names a node by its [`TreePath`]. Applying it walks the operation
//! along the path, synthesizing whatever is missing on the way, and merges the
//! changed node back up so that every untouched subtree keeps its identity.

use std::sync::Arc;

use tracing::trace;
use treeql_schema::{FieldDefinition, TypeDefinition, TypeRef};
use treeql_syntax::{
    Field, InlineFragment, ObjectValue, OperationDefinition, OperationType, Selection,
    SelectionSet, Value,
};

use crate::ancestors::{Ancestor, SchemaDefinition};
use crate::context::Context;
use crate::error::EditError;
use crate::merge::{
    merge_argument_into_field, merge_object_field_into_object_value,
    merge_selection_into_selection_set, merge_selection_set_into_field,
    merge_selection_set_into_inline_fragment, merge_selection_set_into_operation, merge_value,
    push_list_item, remove_list_item, replace_list_item, update_operation_definition,
};
use crate::path::{PathSegment, TreePath};

/// A change made through the tree view.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEdit {
    /// Selects or deselects a field, fragment, argument or input field.
    Toggle(TreePath),
    /// Text typed into the editor of a scalar or enum leaf.
    Input { path: TreePath, text: String },
    /// Replaces the value at an argument, input field or row.
    SetValue { path: TreePath, value: Value },
    /// Appends a synthesized row to a list.
    AddRow(TreePath),
    RemoveRow { path: TreePath, index: usize },
    /// An empty name makes the operation anonymous.
    RenameOperation { operation: usize, name: String },
    SetOperationType {
        operation: usize,
        operation_type: OperationType,
    },
}

impl TreeEdit {
    /// Index of the operation the edit applies to.
    #[must_use]
    pub const fn operation(&self) -> usize {
        match self {
            Self::Toggle(path)
            | Self::Input { path, .. }
            | Self::SetValue { path, .. }
            | Self::AddRow(path)
            | Self::RemoveRow { path, .. } => path.operation,
            Self::RenameOperation { operation, .. } | Self::SetOperationType { operation, .. } => {
                *operation
            }
        }
    }

    /// The addressed node, `None` for operation-level edits.
    #[must_use]
    pub const fn path(&self) -> Option<&TreePath> {
        match self {
            Self::Toggle(path)
            | Self::Input { path, .. }
            | Self::SetValue { path, .. }
            | Self::AddRow(path)
            | Self::RemoveRow { path, .. } => Some(path),
            Self::RenameOperation { .. } | Self::SetOperationType { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Action<'e> {
    Toggle,
    Input(&'e str),
    SetValue(&'e Value),
    AddRow,
    RemoveRow(usize),
}

/// Applies an edit to an operation.
///
/// Returns the operation itself when the edit changes nothing.
pub fn apply_edit(
    cx: Context<'_>,
    operation: &Arc<OperationDefinition>,
    edit: &TreeEdit,
) -> Result<Arc<OperationDefinition>, EditError> {
    let (path, action) = match edit {
        TreeEdit::RenameOperation { name, .. } => {
            return Ok(update_operation_definition(operation, Some(name), None));
        }
        TreeEdit::SetOperationType { operation_type, .. } => {
            return Ok(update_operation_definition(operation, None, Some(*operation_type)));
        }
        TreeEdit::Toggle(path) => (path, Action::Toggle),
        TreeEdit::Input { path, text } => (path, Action::Input(text)),
        TreeEdit::SetValue { path, value } => (path, Action::SetValue(value)),
        TreeEdit::AddRow(path) => (path, Action::AddRow),
        TreeEdit::RemoveRow { path, index } => (path, Action::RemoveRow(*index)),
    };
    if path.segments.is_empty() {
        return Err(EditError::InvalidPath(path.to_string()));
    }

    let root = cx
        .schema
        .root_type_name(operation.operation)
        .and_then(|name| cx.schema.type_definition(name))
        .ok_or(EditError::MissingRootType(operation.operation))?;

    trace!(%path, ?action, "apply edit");
    let pass = EditPass { cx, path, action };
    let set = pass.selection_set(&operation.selection_set, root, 0, None)?;
    Ok(merge_selection_set_into_operation(
        operation,
        Some(&operation.selection_set),
        Some(&set),
    ))
}

struct EditPass<'a, 'e> {
    cx: Context<'a>,
    path: &'e TreePath,
    action: Action<'e>,
}

impl<'a> EditPass<'a, '_> {
    fn segment(&self, depth: usize) -> Option<&PathSegment> {
        self.path.segments.get(depth)
    }

    fn is_target(&self, depth: usize) -> bool {
        depth + 1 == self.path.segments.len()
    }

    /// The path up to and including segment `depth`, for error messages.
    fn prefix(&self, depth: usize) -> String {
        let end = (depth + 1).min(self.path.segments.len());
        TreePath {
            operation: self.path.operation,
            segments: self.path.segments[..end].to_vec(),
        }
        .to_string()
    }

    fn invalid(&self) -> EditError {
        EditError::InvalidPath(self.path.to_string())
    }

    /// Fields and fragments only take toggles.
    fn expect_toggle(&self) -> Result<(), EditError> {
        let path = self.path.to_string();
        match self.action {
            Action::Toggle => Ok(()),
            Action::Input(_) | Action::SetValue(_) => Err(EditError::NotEditable(path)),
            Action::AddRow | Action::RemoveRow(_) => Err(EditError::NotAList(path)),
        }
    }

    fn selection_set(
        &self,
        set: &Arc<SelectionSet>,
        owner: &'a TypeDefinition,
        depth: usize,
        ancestors: Option<&Ancestor<'_>>,
    ) -> Result<Arc<SelectionSet>, EditError> {
        match self.segment(depth) {
            Some(PathSegment::Field(name)) => {
                let definition = owner.field(name).ok_or_else(|| EditError::UnknownField {
                    path: self.prefix(depth),
                    type_name: owner.name().to_string(),
                    name: name.clone(),
                })?;
                let current = set.field(name).map(|field| Selection::Field(Arc::clone(field)));

                if self.is_target(depth) {
                    self.expect_toggle()?;
                    return Ok(match current {
                        Some(current) => merge_selection_into_selection_set(set, Some(&current), None),
                        None => {
                            let field = self.cx.synthesizer().selection(definition, ancestors);
                            merge_selection_into_selection_set(set, None, Some(&field.into()))
                        }
                    });
                }

                let field = match &current {
                    Some(Selection::Field(field)) => Arc::clone(field),
                    _ => Arc::new(self.cx.synthesizer().selection(definition, ancestors)),
                };
                let ancestor = Ancestor::extend(ancestors, SchemaDefinition::Field(definition));
                let field = self.field(&field, definition, depth + 1, &ancestor)?;
                Ok(merge_selection_into_selection_set(
                    set,
                    current.as_ref(),
                    Some(&Selection::Field(field)),
                ))
            }
            Some(PathSegment::Fragment(type_name)) => {
                let object = match owner {
                    TypeDefinition::Interface(_) | TypeDefinition::Union(_) => self
                        .cx
                        .schema
                        .possible_types(owner.name())
                        .into_iter()
                        .find(|object| &object.name == type_name),
                    _ => None,
                };
                let object_type = object
                    .and_then(|object| self.cx.schema.type_definition(&object.name))
                    .ok_or_else(|| EditError::UnknownFragment {
                        path: self.prefix(depth),
                        type_name: type_name.clone(),
                    })?;
                let current = set
                    .inline_fragment(type_name)
                    .map(|fragment| Selection::InlineFragment(Arc::clone(fragment)));

                if self.is_target(depth) {
                    self.expect_toggle()?;
                    return Ok(match current {
                        Some(current) => merge_selection_into_selection_set(set, Some(&current), None),
                        None => {
                            let fragment = self.cx.synthesizer().inline_fragment(type_name);
                            merge_selection_into_selection_set(set, None, Some(&fragment.into()))
                        }
                    });
                }

                let fragment: Arc<InlineFragment> = match &current {
                    Some(Selection::InlineFragment(fragment)) => Arc::clone(fragment),
                    _ => Arc::new(self.cx.synthesizer().inline_fragment(type_name)),
                };
                let nested =
                    self.selection_set(&fragment.selection_set, object_type, depth + 1, ancestors)?;
                let fragment = merge_selection_set_into_inline_fragment(
                    &fragment,
                    Some(&fragment.selection_set),
                    Some(&nested),
                );
                Ok(merge_selection_into_selection_set(
                    set,
                    current.as_ref(),
                    Some(&Selection::InlineFragment(fragment)),
                ))
            }
            _ => Err(self.invalid()),
        }
    }

    fn field(
        &self,
        field: &Arc<Field>,
        definition: &'a FieldDefinition,
        depth: usize,
        ancestor: &Ancestor<'_>,
    ) -> Result<Arc<Field>, EditError> {
        match self.segment(depth) {
            Some(PathSegment::Argument(name)) => {
                let argument_definition =
                    definition
                        .argument(name)
                        .ok_or_else(|| EditError::UnknownArgument {
                            path: self.prefix(depth),
                            field: definition.name.clone(),
                            name: name.clone(),
                        })?;
                let current = field.argument(name);

                if self.is_target(depth) && matches!(self.action, Action::Toggle) {
                    if argument_definition.is_required() {
                        return Err(EditError::Required(self.prefix(depth)));
                    }
                    return Ok(match current {
                        Some(current) => merge_argument_into_field(field, Some(current), None),
                        None => {
                            let argument = self
                                .cx
                                .synthesizer()
                                .argument(argument_definition, Some(ancestor));
                            merge_argument_into_field(field, None, Some(&Arc::new(argument)))
                        }
                    });
                }

                let argument = match current {
                    Some(argument) => Arc::clone(argument),
                    None => Arc::new(
                        self.cx
                            .synthesizer()
                            .argument(argument_definition, Some(ancestor)),
                    ),
                };
                let ancestor = ancestor.child(SchemaDefinition::Argument(argument_definition));
                let value =
                    self.value(&argument.value, &argument_definition.ty, depth + 1, &ancestor)?;
                let argument = merge_value(&argument, value);
                Ok(merge_argument_into_field(field, current, Some(&argument)))
            }
            Some(PathSegment::Field(_) | PathSegment::Fragment(_)) => {
                let ty = self
                    .cx
                    .schema
                    .unwrap_type(&definition.ty)
                    .filter(|ty| ty.is_composite())
                    .ok_or_else(|| self.invalid())?;
                let set = field.selection_set.clone().unwrap_or_default();
                let nested = self.selection_set(&set, ty, depth, Some(ancestor))?;
                Ok(merge_selection_set_into_field(
                    field,
                    field.selection_set.as_ref(),
                    Some(&nested),
                ))
            }
            _ => Err(self.invalid()),
        }
    }

    /// Edits the value of an argument, input field or row of type `ty`.
    ///
    /// `ancestor` ends at the argument or input field holding the value.
    fn value(
        &self,
        value: &Value,
        ty: &'a TypeRef,
        depth: usize,
        ancestor: &Ancestor<'_>,
    ) -> Result<Value, EditError> {
        let Some(segment) = self.segment(depth) else {
            return self.edit_target(value, ty, ancestor);
        };

        match segment {
            PathSegment::Row(index) => {
                let item_type = ty
                    .item_type()
                    .ok_or_else(|| EditError::NotAList(self.prefix(depth - 1)))?;
                let out_of_range = || EditError::RowOutOfRange {
                    path: self.prefix(depth - 1),
                    index: *index,
                };
                match value {
                    Value::List(list) => {
                        let item = list.values.get(*index).ok_or_else(out_of_range)?;
                        let item = self.value(item, item_type, depth + 1, ancestor)?;
                        Ok(Value::List(replace_list_item(list, *index, item)))
                    }
                    // A single value stands for a one-element list.
                    Value::Null(_) => Err(out_of_range()),
                    single if *index == 0 => self.value(single, item_type, depth + 1, ancestor),
                    _ => Err(out_of_range()),
                }
            }
            PathSegment::InputField(name) => {
                let (input_type, input) = match self.cx.schema.unwrap_type(ty) {
                    Some(definition @ TypeDefinition::InputObject(input)) if ty.item_type().is_none() => {
                        (definition, input)
                    }
                    _ => return Err(self.invalid()),
                };
                let ancestor = ancestor.child(SchemaDefinition::Type(input_type));
                let definition =
                    input
                        .fields
                        .get(name)
                        .ok_or_else(|| EditError::UnknownInputField {
                            path: self.prefix(depth),
                            type_name: input.name.clone(),
                            name: name.clone(),
                        })?;
                let object = match value {
                    Value::Object(object) => Arc::clone(object),
                    _ => Arc::new(ObjectValue {
                        fields: Vec::new(),
                        loc: None,
                    }),
                };
                let current = object.field(name);

                let merged = if self.is_target(depth) && matches!(self.action, Action::Toggle) {
                    if definition.is_required() {
                        return Err(EditError::Required(self.prefix(depth)));
                    }
                    match current {
                        Some(current) => merge_object_field_into_object_value(&object, Some(current), None),
                        None => {
                            let field = self.cx.synthesizer().object_field(definition, &ancestor);
                            merge_object_field_into_object_value(&object, None, Some(&Arc::new(field)))
                        }
                    }
                } else {
                    let field = match current {
                        Some(field) => Arc::clone(field),
                        None => Arc::new(self.cx.synthesizer().object_field(definition, &ancestor)),
                    };
                    let field_ancestor = ancestor.child(SchemaDefinition::InputField(definition));
                    let nested = self.value(&field.value, &definition.ty, depth + 1, &field_ancestor)?;
                    let field = merge_value(&field, nested);
                    merge_object_field_into_object_value(&object, current, Some(&field))
                };

                match value {
                    Value::Object(original) if Arc::ptr_eq(original, &merged) => Ok(value.clone()),
                    _ => Ok(Value::Object(merged)),
                }
            }
            _ => Err(self.invalid()),
        }
    }

    /// Applies the action to the value the path ends at.
    fn edit_target(
        &self,
        value: &Value,
        ty: &'a TypeRef,
        ancestor: &Ancestor<'_>,
    ) -> Result<Value, EditError> {
        let path = self.path.to_string();
        match self.action {
            Action::Toggle => Err(EditError::NotToggleable(path)),
            Action::SetValue(next) => Ok(keep_same(value, next.clone())),
            Action::Input(text) => {
                if ty.item_type().is_some() {
                    return Err(EditError::NotEditable(path));
                }
                self.cx
                    .schema
                    .unwrap_type(ty)
                    .and_then(|definition| self.cx.scalars.value_from_input(definition, text))
                    .map(|next| keep_same(value, next))
                    .ok_or(EditError::NotEditable(path))
            }
            Action::AddRow => {
                let item_type = ty.item_type().ok_or(EditError::NotAList(path))?;
                let item = self.cx.synthesizer().default_value(item_type, ancestor);
                Ok(match value {
                    Value::List(list) => Value::List(push_list_item(list, item)),
                    Value::Null(_) => Value::list(vec![item]),
                    single => Value::list(vec![single.clone(), item]),
                })
            }
            Action::RemoveRow(index) => {
                if ty.item_type().is_none() {
                    return Err(EditError::NotAList(path));
                }
                match value {
                    Value::List(list) if index < list.values.len() => {
                        Ok(Value::List(remove_list_item(list, index)))
                    }
                    Value::List(_) | Value::Null(_) => Err(EditError::RowOutOfRange { path, index }),
                    // The only row of a single value is the anchoring first one.
                    _ if index == 0 => Ok(value.clone()),
                    _ => Err(EditError::RowOutOfRange { path, index }),
                }
            }
        }
    }
}

/// `current` when `next` holds the same leaf, so the edit stays a no-op.
fn keep_same(current: &Value, next: Value) -> Value {
    let same = match (current, &next) {
        (Value::Int(a), Value::Int(b)) => a.value == b.value,
        (Value::Float(a), Value::Float(b)) => a.value == b.value,
        (Value::String(a), Value::String(b)) => a.value == b.value,
        (Value::Boolean(a), Value::Boolean(b)) => a.value == b.value,
        (Value::Enum(a), Value::Enum(b)) => a.value == b.value,
        (Value::Variable(a), Value::Variable(b)) => a.name.value == b.name.value,
        (Value::Null(_), Value::Null(_)) => true,
        _ => current.ptr_eq(&next),
    };
    if same {
        current.clone()
    } else {
        next
    }
}
