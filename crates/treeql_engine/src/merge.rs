//! Structural merges.
//!
//! Every merge takes a container and a `(prev, next)` pair of children and returns
//! the rebuilt container:
//!
//! - `prev` and `next` identical (both `None`, or the same node): the container
//!   itself is returned, so callers can compare results by identity;
//! - only `prev`: the child with `prev`'s key is removed;
//! - only `next`: `next` is inserted;
//! - both: the child with the matching key is replaced by `next`.
//!
//! Keyed collections come back in canonical order (see [`crate::order`]).
//! Rebuilt nodes carry no location.

use std::sync::Arc;

use tracing::trace;
use treeql_syntax::{
    Argument, Definition, Document, Field, InlineFragment, ListValue, Name, ObjectField,
    ObjectValue, OperationDefinition, OperationType, Selection, SelectionSet, Value,
    VariableDefinition,
};

use crate::order::{self, Keyed};

/// Merges `(prev, next)` into a keyed collection.
///
/// Returns `None` when the pair is a no-op.
fn merge_keyed<T: Keyed + Clone>(entries: &[T], prev: Option<&T>, next: Option<&T>) -> Option<Vec<T>> {
    match (prev, next) {
        (None, None) => return None,
        (Some(prev), Some(next)) if prev.same(next) => return None,
        _ => {}
    }

    let mut merged: Vec<T> = entries
        .iter()
        .filter(|entry| {
            let key = entry.key();
            prev.map_or(true, |prev| prev.key() != key) && next.map_or(true, |next| next.key() != key)
        })
        .cloned()
        .collect();
    merged.extend(next.cloned());
    order::sort(&mut merged);
    Some(merged)
}

/// Merges an argument into a field's argument list.
#[must_use]
pub fn merge_argument_into_field(
    field: &Arc<Field>,
    prev: Option<&Arc<Argument>>,
    next: Option<&Arc<Argument>>,
) -> Arc<Field> {
    match merge_keyed(&field.arguments, prev, next) {
        Some(arguments) => {
            trace!(field = %field.name, "merge argument");
            Arc::new(Field {
                arguments,
                loc: None,
                ..(**field).clone()
            })
        }
        None => Arc::clone(field),
    }
}

/// Merges an input field into an object value.
#[must_use]
pub fn merge_object_field_into_object_value(
    object: &Arc<ObjectValue>,
    prev: Option<&Arc<ObjectField>>,
    next: Option<&Arc<ObjectField>>,
) -> Arc<ObjectValue> {
    match merge_keyed(&object.fields, prev, next) {
        Some(fields) => Arc::new(ObjectValue { fields, loc: None }),
        None => Arc::clone(object),
    }
}

/// A node holding one input value: an argument or an input object field.
pub trait InputNode: Sized {
    fn value(&self) -> &Value;

    /// A copy holding another value, without a location.
    #[must_use]
    fn with_value(&self, value: Value) -> Self;
}

impl InputNode for Argument {
    fn value(&self) -> &Value {
        &self.value
    }

    fn with_value(&self, value: Value) -> Self {
        Self {
            name: self.name.clone(),
            value,
            loc: None,
        }
    }
}

impl InputNode for ObjectField {
    fn value(&self) -> &Value {
        &self.value
    }

    fn with_value(&self, value: Value) -> Self {
        Self {
            name: self.name.clone(),
            value,
            loc: None,
        }
    }
}

/// Replaces the value held by an argument or input field.
///
/// Returns the node itself when `value` is the value it already holds.
#[must_use]
pub fn merge_value<N: InputNode>(node: &Arc<N>, value: Value) -> Arc<N> {
    if node.value().ptr_eq(&value) {
        Arc::clone(node)
    } else {
        Arc::new(node.with_value(value))
    }
}

/// Merges an input field into the object value held by `value`.
///
/// For a list of objects, `index` addresses the element (the first one when
/// `None`). A value that is not an object yet becomes one when a field is
/// inserted.
fn merge_object_field_into_value(
    value: &Value,
    prev: Option<&Arc<ObjectField>>,
    next: Option<&Arc<ObjectField>>,
    index: Option<usize>,
) -> Value {
    match value {
        Value::List(list) => {
            let index = index.unwrap_or(0);
            let Some(item) = list.values.get(index) else {
                return value.clone();
            };
            let merged = merge_object_field_into_value(item, prev, next, None);
            if merged.ptr_eq(item) {
                value.clone()
            } else {
                Value::List(replace_list_item(list, index, merged))
            }
        }
        Value::Object(object) => Value::Object(merge_object_field_into_object_value(object, prev, next)),
        _ if next.is_some() => {
            let empty = Arc::new(ObjectValue {
                fields: Vec::new(),
                loc: None,
            });
            Value::Object(merge_object_field_into_object_value(&empty, None, next))
        }
        _ => value.clone(),
    }
}

fn merge_object_field_into_input<N: InputNode>(
    node: &Arc<N>,
    prev: Option<&Arc<ObjectField>>,
    next: Option<&Arc<ObjectField>>,
    index: Option<usize>,
) -> Arc<N> {
    let value = merge_object_field_into_value(node.value(), prev, next, index);
    merge_value(node, value)
}

/// Merges an input field into an argument's object value, or into element
/// `index` of its list of objects.
#[must_use]
pub fn merge_object_field_into_argument(
    argument: &Arc<Argument>,
    prev: Option<&Arc<ObjectField>>,
    next: Option<&Arc<ObjectField>>,
    index: Option<usize>,
) -> Arc<Argument> {
    merge_object_field_into_input(argument, prev, next, index)
}

/// Merges an input field into another input field's nested object value, or
/// into element `index` of its list of objects.
#[must_use]
pub fn merge_object_field_into_object_field(
    field: &Arc<ObjectField>,
    prev: Option<&Arc<ObjectField>>,
    next: Option<&Arc<ObjectField>>,
    index: Option<usize>,
) -> Arc<ObjectField> {
    merge_object_field_into_input(field, prev, next, index)
}

/// Merges a selection into a selection set.
///
/// Fields are keyed by name, inline fragments by type condition.
#[must_use]
pub fn merge_selection_into_selection_set(
    set: &Arc<SelectionSet>,
    prev: Option<&Selection>,
    next: Option<&Selection>,
) -> Arc<SelectionSet> {
    match merge_keyed(&set.selections, prev, next) {
        Some(selections) => Arc::new(SelectionSet {
            selections,
            loc: None,
        }),
        None => Arc::clone(set),
    }
}

/// Merges a field into an inline fragment's selection set.
#[must_use]
pub fn merge_field_into_inline_fragment(
    fragment: &Arc<InlineFragment>,
    prev: Option<&Arc<Field>>,
    next: Option<&Arc<Field>>,
) -> Arc<InlineFragment> {
    let prev = prev.map(|field| Selection::Field(Arc::clone(field)));
    let next = next.map(|field| Selection::Field(Arc::clone(field)));
    let set = merge_selection_into_selection_set(&fragment.selection_set, prev.as_ref(), next.as_ref());
    merge_selection_set_into_inline_fragment(fragment, Some(&fragment.selection_set), Some(&set))
}

fn same_set(prev: Option<&Arc<SelectionSet>>, next: Option<&Arc<SelectionSet>>) -> bool {
    match (prev, next) {
        (None, None) => true,
        (Some(prev), Some(next)) => Arc::ptr_eq(prev, next),
        _ => false,
    }
}

/// Replaces a field's selection set. `next = None` removes it.
#[must_use]
pub fn merge_selection_set_into_field(
    field: &Arc<Field>,
    prev: Option<&Arc<SelectionSet>>,
    next: Option<&Arc<SelectionSet>>,
) -> Arc<Field> {
    if same_set(prev, next) {
        return Arc::clone(field);
    }
    Arc::new(Field {
        selection_set: next.cloned(),
        loc: None,
        ..(**field).clone()
    })
}

/// Replaces an inline fragment's selection set. `next = None` leaves it empty.
#[must_use]
pub fn merge_selection_set_into_inline_fragment(
    fragment: &Arc<InlineFragment>,
    prev: Option<&Arc<SelectionSet>>,
    next: Option<&Arc<SelectionSet>>,
) -> Arc<InlineFragment> {
    if same_set(prev, next) {
        return Arc::clone(fragment);
    }
    Arc::new(InlineFragment {
        selection_set: next.cloned().unwrap_or_default(),
        loc: None,
        ..(**fragment).clone()
    })
}

/// Replaces the selection set of a field or inline fragment selection.
///
/// Fragment spreads have no selection set of their own and are returned as is.
#[must_use]
pub fn merge_selection_set_into_selection(
    selection: &Selection,
    prev: Option<&Arc<SelectionSet>>,
    next: Option<&Arc<SelectionSet>>,
) -> Selection {
    match selection {
        Selection::Field(field) => Selection::Field(merge_selection_set_into_field(field, prev, next)),
        Selection::InlineFragment(fragment) => {
            Selection::InlineFragment(merge_selection_set_into_inline_fragment(fragment, prev, next))
        }
        Selection::FragmentSpread(_) => selection.clone(),
    }
}

/// Replaces an operation's selection set. `next = None` leaves it empty.
#[must_use]
pub fn merge_selection_set_into_operation(
    operation: &Arc<OperationDefinition>,
    prev: Option<&Arc<SelectionSet>>,
    next: Option<&Arc<SelectionSet>>,
) -> Arc<OperationDefinition> {
    if same_set(prev, next) {
        return Arc::clone(operation);
    }
    trace!("merge selection set into operation");
    Arc::new(OperationDefinition {
        selection_set: next.cloned().unwrap_or_default(),
        loc: None,
        ..(**operation).clone()
    })
}

/// Replaces an operation in a document by identity.
///
/// Other definitions pass through untouched. `prev = None` appends `next`,
/// `next = None` removes `prev`.
#[must_use]
pub fn merge_operation_into_document(
    document: &Arc<Document>,
    prev: Option<&Arc<OperationDefinition>>,
    next: Option<&Arc<OperationDefinition>>,
) -> Arc<Document> {
    let definitions = match (prev, next) {
        (None, None) => return Arc::clone(document),
        (Some(prev), Some(next)) if Arc::ptr_eq(prev, next) => return Arc::clone(document),
        (Some(prev), next) => document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Operation(op) if Arc::ptr_eq(op, prev) => {
                    next.map(|next| Definition::Operation(Arc::clone(next)))
                }
                other => Some(other.clone()),
            })
            .collect(),
        (None, Some(next)) => {
            let mut definitions = document.definitions.clone();
            definitions.push(Definition::Operation(Arc::clone(next)));
            definitions
        }
    };
    Arc::new(Document {
        definitions,
        loc: None,
    })
}

/// Renames an operation and changes its type.
///
/// `None` keeps the current value. An empty name makes the operation anonymous.
#[must_use]
pub fn update_operation_definition(
    operation: &Arc<OperationDefinition>,
    name: Option<&str>,
    operation_type: Option<OperationType>,
) -> Arc<OperationDefinition> {
    let current_name = operation.name.as_ref().map_or("", Name::as_str);
    let name_changed = name.is_some_and(|name| name != current_name);
    let type_changed = operation_type.is_some_and(|ty| ty != operation.operation);
    if !name_changed && !type_changed {
        return Arc::clone(operation);
    }

    let mut updated = (**operation).clone();
    if let Some(name) = name.filter(|_| name_changed) {
        updated.name = (!name.is_empty()).then(|| Name::new(name));
    }
    if let Some(ty) = operation_type {
        updated.operation = ty;
    }
    updated.loc = None;
    Arc::new(updated)
}

/// Adds, replaces or removes a variable definition, keyed by variable name.
///
/// Variable definitions keep their declaration order.
#[must_use]
pub fn update_operation_variable(
    operation: &Arc<OperationDefinition>,
    prev: Option<&Arc<VariableDefinition>>,
    next: Option<&Arc<VariableDefinition>>,
) -> Arc<OperationDefinition> {
    let name_of = |definition: &Arc<VariableDefinition>| definition.variable.name.value.clone();
    let variable_definitions = match (prev, next) {
        (None, None) => return Arc::clone(operation),
        (Some(prev), Some(next)) if Arc::ptr_eq(prev, next) => return Arc::clone(operation),
        (Some(prev), next) => {
            let key = name_of(prev);
            let mut replaced = false;
            let mut definitions: Vec<_> = operation
                .variable_definitions
                .iter()
                .filter_map(|definition| {
                    if name_of(definition) != key {
                        return Some(Arc::clone(definition));
                    }
                    replaced = true;
                    next.cloned()
                })
                .collect();
            if !replaced {
                definitions.extend(next.cloned());
            }
            definitions
        }
        (None, Some(next)) => {
            let key = name_of(next);
            let mut definitions: Vec<_> = operation
                .variable_definitions
                .iter()
                .filter(|definition| name_of(definition) != key)
                .cloned()
                .collect();
            definitions.push(Arc::clone(next));
            definitions
        }
    };
    Arc::new(OperationDefinition {
        variable_definitions,
        loc: None,
        ..(**operation).clone()
    })
}

/// Appends an element to a list value.
#[must_use]
pub fn push_list_item(list: &Arc<ListValue>, item: Value) -> Arc<ListValue> {
    let mut values = list.values.clone();
    values.push(item);
    Arc::new(ListValue { values, loc: None })
}

/// Replaces element `index` of a list value. Out of range is a no-op.
#[must_use]
pub fn replace_list_item(list: &Arc<ListValue>, index: usize, item: Value) -> Arc<ListValue> {
    match list.values.get(index) {
        Some(current) if !current.ptr_eq(&item) => {
            let mut values = list.values.clone();
            values[index] = item;
            Arc::new(ListValue { values, loc: None })
        }
        _ => Arc::clone(list),
    }
}

/// Removes element `index` of a list value.
///
/// The first element anchors the list and is never removed; removing it, or
/// an index out of range, is a no-op.
#[must_use]
pub fn remove_list_item(list: &Arc<ListValue>, index: usize) -> Arc<ListValue> {
    if index == 0 || index >= list.values.len() {
        return Arc::clone(list);
    }
    let mut values = list.values.clone();
    values.remove(index);
    Arc::new(ListValue { values, loc: None })
}
