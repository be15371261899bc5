//! Abstract syntax tree for GraphQL documents.
//!
//! Nodes are persistent. Children are shared through [`Arc`], an edit rebuilds only
//! the parents on the path to the changed node, and node identity is
//! [`Arc::ptr_eq`]. `PartialEq` compares content only: source locations are ignored,
//! so a parsed node and a hand-built one with the same content are equal.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use treeql_core::Location;

/// Anything that may remember where in source it was parsed from.
pub trait Located {
    /// The source location, `None` for nodes built in memory.
    fn location(&self) -> Option<&Location>;

    /// The exact source text this node was parsed from.
    fn source_text(&self) -> Option<&str> {
        self.location().and_then(Location::text)
    }
}

impl<T: Located + ?Sized> Located for Arc<T> {
    fn location(&self) -> Option<&Location> {
        (**self).location()
    }
}

macro_rules! impl_located {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Located for $ty {
                fn location(&self) -> Option<&Location> {
                    self.loc.as_ref()
                }
            }
        )*
    };
}

impl_located!(
    Name,
    Document,
    OperationDefinition,
    VariableDefinition,
    SelectionSet,
    Field,
    FragmentSpread,
    InlineFragment,
    FragmentDefinition,
    Argument,
    ObjectField,
    Directive,
    Variable,
    IntValue,
    FloatValue,
    StringValue,
    BooleanValue,
    NullValue,
    EnumValue,
    ListValue,
    ObjectValue,
    SchemaDefinition,
    TypeDefinition,
    FieldDefinition,
    InputValueDefinition,
    EnumValueDefinition,
    DirectiveDefinition,
);

/// A name with its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub value: String,
    pub loc: Option<Location>,
}

impl Name {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            loc: None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A complete document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub definitions: Vec<Definition>,
    pub loc: Option<Location>,
}

impl Document {
    #[must_use]
    pub fn new(definitions: Vec<Definition>) -> Self {
        Self {
            definitions,
            loc: None,
        }
    }

    /// Operation definitions in document order.
    pub fn operations(&self) -> impl Iterator<Item = &Arc<OperationDefinition>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            _ => None,
        })
    }

    /// The `index`-th operation definition.
    #[must_use]
    pub fn operation(&self, index: usize) -> Option<&Arc<OperationDefinition>> {
        self.operations().nth(index)
    }
}

/// A top-level definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Operation(Arc<OperationDefinition>),
    Fragment(Arc<FragmentDefinition>),
    Schema(Arc<SchemaDefinition>),
    Type(Arc<TypeDefinition>),
    Directive(Arc<DirectiveDefinition>),
}

// =============================================================================
// Executable definitions
// =============================================================================

/// Type of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OperationType {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "query" => Some(Self::Query),
            "mutation" => Some(Self::Mutation),
            "subscription" => Some(Self::Subscription),
            _ => None,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation definition.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    pub operation: OperationType,
    pub name: Option<Name>,
    pub variable_definitions: Vec<Arc<VariableDefinition>>,
    pub directives: Vec<Arc<Directive>>,
    pub selection_set: Arc<SelectionSet>,
    pub loc: Option<Location>,
}

impl OperationDefinition {
    #[must_use]
    pub fn new(operation: OperationType, name: Option<Name>, selection_set: SelectionSet) -> Self {
        Self {
            operation,
            name,
            variable_definitions: Vec::new(),
            directives: Vec::new(),
            selection_set: Arc::new(selection_set),
            loc: None,
        }
    }
}

/// A variable definition: `$id: ID! = 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub variable: Variable,
    pub ty: Type,
    pub default_value: Option<Value>,
    pub directives: Vec<Arc<Directive>>,
    pub loc: Option<Location>,
}

impl VariableDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            variable: Variable::new(name),
            ty,
            default_value: None,
            directives: Vec::new(),
            loc: None,
        }
    }
}

/// A selection set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
    pub loc: Option<Location>,
}

impl SelectionSet {
    #[must_use]
    pub fn new(selections: Vec<Selection>) -> Self {
        Self {
            selections,
            loc: None,
        }
    }

    /// The field selection with the given field name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Arc<Field>> {
        self.selections.iter().find_map(|selection| match selection {
            Selection::Field(field) if field.name.value == name => Some(field),
            _ => None,
        })
    }

    /// The inline fragment with the given type condition.
    #[must_use]
    pub fn inline_fragment(&self, type_condition: &str) -> Option<&Arc<InlineFragment>> {
        self.selections.iter().find_map(|selection| match selection {
            Selection::InlineFragment(fragment)
                if fragment.type_condition.as_ref().map(Name::as_str) == Some(type_condition) =>
            {
                Some(fragment)
            }
            _ => None,
        })
    }
}

/// A selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Arc<Field>),
    FragmentSpread(Arc<FragmentSpread>),
    InlineFragment(Arc<InlineFragment>),
}

impl Selection {
    /// Identity comparison: same variant pointing at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Field(a), Self::Field(b)) => Arc::ptr_eq(a, b),
            (Self::FragmentSpread(a), Self::FragmentSpread(b)) => Arc::ptr_eq(a, b),
            (Self::InlineFragment(a), Self::InlineFragment(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The nested selection set, if this selection has one.
    #[must_use]
    pub fn selection_set(&self) -> Option<&Arc<SelectionSet>> {
        match self {
            Self::Field(field) => field.selection_set.as_ref(),
            Self::InlineFragment(fragment) => Some(&fragment.selection_set),
            Self::FragmentSpread(_) => None,
        }
    }
}

impl Located for Selection {
    fn location(&self) -> Option<&Location> {
        match self {
            Self::Field(node) => node.location(),
            Self::FragmentSpread(node) => node.location(),
            Self::InlineFragment(node) => node.location(),
        }
    }
}

impl From<Field> for Selection {
    fn from(field: Field) -> Self {
        Self::Field(Arc::new(field))
    }
}

impl From<InlineFragment> for Selection {
    fn from(fragment: InlineFragment) -> Self {
        Self::InlineFragment(Arc::new(fragment))
    }
}

/// A field selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Arc<Argument>>,
    pub directives: Vec<Arc<Directive>>,
    pub selection_set: Option<Arc<SelectionSet>>,
    pub loc: Option<Location>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: Name::new(name),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection_set: None,
            loc: None,
        }
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: Vec<Argument>) -> Self {
        self.arguments = arguments.into_iter().map(Arc::new).collect();
        self
    }

    #[must_use]
    pub fn with_selection_set(mut self, selection_set: SelectionSet) -> Self {
        self.selection_set = Some(Arc::new(selection_set));
        self
    }

    /// The argument with the given name.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Arc<Argument>> {
        self.arguments.iter().find(|arg| arg.name.value == name)
    }
}

/// A fragment spread: `...UserFields`.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    pub name: Name,
    pub directives: Vec<Arc<Directive>>,
    pub loc: Option<Location>,
}

/// An inline fragment: `... on User { id }`.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<Name>,
    pub directives: Vec<Arc<Directive>>,
    pub selection_set: Arc<SelectionSet>,
    pub loc: Option<Location>,
}

impl InlineFragment {
    pub fn new(type_condition: impl Into<String>, selection_set: SelectionSet) -> Self {
        Self {
            type_condition: Some(Name::new(type_condition)),
            directives: Vec::new(),
            selection_set: Arc::new(selection_set),
            loc: None,
        }
    }
}

/// A fragment definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    pub name: Name,
    pub type_condition: Name,
    pub directives: Vec<Arc<Directive>>,
    pub selection_set: Arc<SelectionSet>,
    pub loc: Option<Location>,
}

/// An argument: `id: 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Name,
    pub value: Value,
    pub loc: Option<Location>,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: Name::new(name),
            value,
            loc: None,
        }
    }
}

/// A field of an object value: `name: ""`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub name: Name,
    pub value: Value,
    pub loc: Option<Location>,
}

impl ObjectField {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: Name::new(name),
            value,
            loc: None,
        }
    }
}

/// A directive application: `@include(if: $flag)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: Name,
    pub arguments: Vec<Arc<Argument>>,
    pub loc: Option<Location>,
}

// =============================================================================
// Values
// =============================================================================

/// An input value literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Variable(Variable),
    Int(IntValue),
    Float(FloatValue),
    String(StringValue),
    Boolean(BooleanValue),
    Null(NullValue),
    Enum(EnumValue),
    List(Arc<ListValue>),
    Object(Arc<ObjectValue>),
}

/// The variant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueKind {
    Variable,
    Int,
    Float,
    String,
    Boolean,
    Null,
    Enum,
    List,
    Object,
}

impl Value {
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Int(IntValue {
            value: value.to_string(),
            loc: None,
        })
    }

    pub fn float(value: impl Into<String>) -> Self {
        Self::Float(FloatValue {
            value: value.into(),
            loc: None,
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(StringValue {
            value: value.into(),
            loc: None,
        })
    }

    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(BooleanValue { value, loc: None })
    }

    #[must_use]
    pub fn null() -> Self {
        Self::Null(NullValue { loc: None })
    }

    pub fn enum_value(value: impl Into<String>) -> Self {
        Self::Enum(EnumValue {
            value: value.into(),
            loc: None,
        })
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(Variable::new(name))
    }

    #[must_use]
    pub fn list(values: Vec<Value>) -> Self {
        Self::List(Arc::new(ListValue { values, loc: None }))
    }

    #[must_use]
    pub fn object(fields: Vec<ObjectField>) -> Self {
        Self::Object(Arc::new(ObjectValue {
            fields: fields.into_iter().map(Arc::new).collect(),
            loc: None,
        }))
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Variable(_) => ValueKind::Variable,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Null(_) => ValueKind::Null,
            Self::Enum(_) => ValueKind::Enum,
            Self::List(_) => ValueKind::List,
            Self::Object(_) => ValueKind::Object,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Arc<ObjectValue>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&Arc<ListValue>> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// Identity for the shared variants, equality for scalar ones.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::List(_) | Self::Object(_), _) | (_, Self::List(_) | Self::Object(_)) => false,
            (a, b) => a == b,
        }
    }
}

impl Located for Value {
    fn location(&self) -> Option<&Location> {
        match self {
            Self::Variable(v) => v.location(),
            Self::Int(v) => v.location(),
            Self::Float(v) => v.location(),
            Self::String(v) => v.location(),
            Self::Boolean(v) => v.location(),
            Self::Null(v) => v.location(),
            Self::Enum(v) => v.location(),
            Self::List(v) => v.location(),
            Self::Object(v) => v.location(),
        }
    }
}

/// A variable reference: `$id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Name,
    pub loc: Option<Location>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Name::new(name),
            loc: None,
        }
    }
}

/// An integer literal, kept as written.
#[derive(Debug, Clone, PartialEq)]
pub struct IntValue {
    pub value: String,
    pub loc: Option<Location>,
}

/// A float literal, kept as written.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatValue {
    pub value: String,
    pub loc: Option<Location>,
}

/// A string literal, already unescaped.
#[derive(Debug, Clone, PartialEq)]
pub struct StringValue {
    pub value: String,
    pub loc: Option<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanValue {
    pub value: bool,
    pub loc: Option<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullValue {
    pub loc: Option<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub value: String,
    pub loc: Option<Location>,
}

/// A list literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ListValue {
    pub values: Vec<Value>,
    pub loc: Option<Location>,
}

/// An object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub fields: Vec<Arc<ObjectField>>,
    pub loc: Option<Location>,
}

impl ObjectValue {
    /// The field with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Arc<ObjectField>> {
        self.fields.iter().find(|field| field.name.value == name)
    }
}

// =============================================================================
// Types
// =============================================================================

/// A type reference as written in source: `[ID!]!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Named(Name),
    List(Box<Type>),
    NonNull(Box<Type>),
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(Name::new(name))
    }

    #[must_use]
    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    #[must_use]
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// The innermost named type.
    #[must_use]
    pub fn name(&self) -> &Name {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.name(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

// =============================================================================
// Type system definitions
// =============================================================================

/// A root operation type entry inside `schema { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct RootOperationType {
    pub operation: OperationType,
    pub named_type: Name,
}

/// `schema { query: Query }` or its extension.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    pub description: Option<String>,
    pub extension: bool,
    pub directives: Vec<Arc<Directive>>,
    pub root_operations: Vec<RootOperationType>,
    pub loc: Option<Location>,
}

/// A named type definition or extension.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub description: Option<String>,
    pub extension: bool,
    pub name: Name,
    pub directives: Vec<Arc<Directive>>,
    pub kind: TypeDefinitionKind,
    pub loc: Option<Location>,
}

/// The shape of a type definition.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinitionKind {
    Scalar,
    Object {
        interfaces: Vec<Name>,
        fields: Vec<FieldDefinition>,
    },
    Interface {
        interfaces: Vec<Name>,
        fields: Vec<FieldDefinition>,
    },
    Union {
        members: Vec<Name>,
    },
    Enum {
        values: Vec<EnumValueDefinition>,
    },
    InputObject {
        fields: Vec<InputValueDefinition>,
    },
}

impl TypeDefinitionKind {
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object { .. } => "type",
            Self::Interface { .. } => "interface",
            Self::Union { .. } => "union",
            Self::Enum { .. } => "enum",
            Self::InputObject { .. } => "input",
        }
    }
}

/// A field definition in an object or interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: Type,
    pub directives: Vec<Arc<Directive>>,
    pub loc: Option<Location>,
}

/// An argument definition or input object field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<Value>,
    pub directives: Vec<Arc<Directive>>,
    pub loc: Option<Location>,
}

/// An enum value definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: Vec<Arc<Directive>>,
    pub loc: Option<Location>,
}

/// `directive @name(args) repeatable on LOCATION | ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition>,
    pub repeatable: bool,
    pub locations: Vec<Name>,
    pub loc: Option<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        let ty = Type::named("String").non_null().list().non_null();
        assert_eq!(ty.to_string(), "[String!]!");
        assert_eq!(ty.name().as_str(), "String");
    }

    #[test]
    fn test_selection_ptr_eq() {
        let field = Arc::new(Field::new("id"));
        let a = Selection::Field(Arc::clone(&field));
        let b = Selection::Field(field);
        let c = Selection::from(Field::new("id"));

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a, c);
    }

    #[test]
    fn test_value_ptr_eq() {
        let object = Value::object(vec![ObjectField::new("a", Value::int(1))]);
        let same = object.clone();
        let copy = Value::object(vec![ObjectField::new("a", Value::int(1))]);

        assert!(object.ptr_eq(&same));
        assert!(!object.ptr_eq(&copy));
        assert!(Value::int(0).ptr_eq(&Value::int(0)));
    }

    #[test]
    fn test_document_operations() {
        let doc = Document::new(vec![Definition::Operation(Arc::new(
            OperationDefinition::new(OperationType::Query, None, SelectionSet::default()),
        ))]);
        assert_eq!(doc.operations().count(), 1);
        assert!(doc.operation(1).is_none());
    }
}
