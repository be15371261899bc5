//! Synthesis of minimal valid AST fragments from schema types.

use std::sync::Arc;

use tracing::{debug, trace};
use treeql_schema::{
    FieldDefinition, InputObjectType, InputValueDefinition, TypeDefinition, TypeRef,
};
use treeql_syntax::{
    format, print, Argument, Definition, Document, Field, FormatOptions, InlineFragment, Name,
    ObjectField, ObjectValue, OperationDefinition, OperationType, SelectionSet, Value,
};

use crate::ancestors::{Ancestor, SchemaDefinition};
use crate::context::Context;
use crate::order;

/// The marker field put into every synthesized selection set.
pub const TYPENAME_FIELD: &str = "__typename";

/// Builds default values, arguments and selections.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'a> {
    cx: Context<'a>,
}

impl<'a> Synthesizer<'a> {
    #[must_use]
    pub const fn new(cx: Context<'a>) -> Self {
        Self { cx }
    }

    /// The default value for a type.
    ///
    /// `path` starts at the argument or input field the value is for. Lists get
    /// one synthesized element, input objects their required fields plus those an
    /// override selects, enums `null`, and scalars the zero value of their kind.
    #[must_use]
    pub fn default_value(&self, ty: &TypeRef, path: &Ancestor<'_>) -> Value {
        self.value_at(ty, path, 0)
    }

    /// `depth` counts the lists and input objects entered so far.
    fn value_at(&self, ty: &TypeRef, path: &Ancestor<'_>, depth: usize) -> Value {
        match ty {
            TypeRef::NonNull(inner) => self.value_at(inner, path, depth),
            TypeRef::List(inner) => {
                if self.too_deep(path, depth) {
                    return Value::null();
                }
                Value::list(vec![self.value_at(inner, path, depth + 1)])
            }
            TypeRef::Named(name) => match self.cx.schema.type_definition(name) {
                Some(definition @ TypeDefinition::InputObject(input)) => {
                    if self.too_deep(path, depth) {
                        return Value::null();
                    }
                    let type_path = path.child(SchemaDefinition::Type(definition));
                    self.object_value(input, &type_path, depth + 1)
                }
                Some(TypeDefinition::Scalar(scalar)) => self.cx.scalars.default_value(&scalar.name),
                _ => Value::null(),
            },
        }
    }

    fn too_deep(&self, path: &Ancestor<'_>, depth: usize) -> bool {
        let too_deep = depth >= self.cx.max_depth;
        if too_deep {
            debug!(path = %path.dotted(), depth, "synthesis depth limit reached");
        }
        too_deep
    }

    fn object_value(&self, input: &InputObjectType, parent: &Ancestor<'_>, depth: usize) -> Value {
        let mut fields: Vec<Arc<ObjectField>> = input
            .fields
            .values()
            .filter_map(|field| {
                let path = parent.child(SchemaDefinition::InputField(field));
                self.included_value(field, &path, depth)
                    .map(|value| Arc::new(ObjectField::new(field.name.clone(), value)))
            })
            .collect();
        order::sort(&mut fields);
        Value::Object(Arc::new(ObjectValue { fields, loc: None }))
    }

    /// The value of an argument or input field that is included by default:
    /// the override's value if it gives one, the synthesized default if the
    /// definition is required, otherwise nothing.
    fn included_value(
        &self,
        definition: &InputValueDefinition,
        path: &Ancestor<'_>,
        depth: usize,
    ) -> Option<Value> {
        match self.cx.hooks.default_value(definition, path) {
            Some(value) => Some(value),
            None if definition.is_required() => Some(self.value_at(&definition.ty, path, depth)),
            None => None,
        }
    }

    /// The value for an argument or input field the user selected.
    fn selected_value(&self, definition: &InputValueDefinition, path: &Ancestor<'_>) -> Value {
        self.cx
            .hooks
            .default_value(definition, path)
            .unwrap_or_else(|| self.value_at(&definition.ty, path, 0))
    }

    /// An argument with its default value.
    ///
    /// `parent` is the path of the field the argument belongs to.
    #[must_use]
    pub fn argument(
        &self,
        definition: &InputValueDefinition,
        parent: Option<&Ancestor<'_>>,
    ) -> Argument {
        let path = Ancestor::extend(parent, SchemaDefinition::Argument(definition));
        trace!(argument = %path.dotted(), "synthesize argument");
        Argument::new(definition.name.clone(), self.selected_value(definition, &path))
    }

    /// An input object field with its default value.
    ///
    /// `parent` ends at the input object type holding the field.
    #[must_use]
    pub fn object_field(
        &self,
        definition: &InputValueDefinition,
        parent: &Ancestor<'_>,
    ) -> ObjectField {
        let path = parent.child(SchemaDefinition::InputField(definition));
        trace!(field = %path.dotted(), "synthesize input field");
        ObjectField::new(definition.name.clone(), self.selected_value(definition, &path))
    }

    /// A minimal selection of a field.
    ///
    /// Only required or override-selected arguments are included. A composite
    /// field gets a selection set holding `__typename` and is never expanded
    /// further.
    #[must_use]
    pub fn selection(&self, definition: &FieldDefinition, parent: Option<&Ancestor<'_>>) -> Field {
        let path = Ancestor::extend(parent, SchemaDefinition::Field(definition));
        trace!(field = %path.dotted(), "synthesize selection");

        let mut arguments: Vec<Arc<Argument>> = definition
            .arguments
            .iter()
            .filter_map(|argument| {
                let argument_path = path.child(SchemaDefinition::Argument(argument));
                self.included_value(argument, &argument_path, 0)
                    .map(|value| Arc::new(Argument::new(argument.name.clone(), value)))
            })
            .collect();
        order::sort(&mut arguments);

        let mut field = Field::new(definition.name.clone());
        field.arguments = arguments;
        if self
            .cx
            .schema
            .unwrap_type(&definition.ty)
            .is_some_and(TypeDefinition::is_composite)
        {
            field.selection_set = Some(Arc::new(typename_selection_set()));
        }
        field
    }

    /// An inline fragment on a type, selecting only `__typename`.
    #[must_use]
    pub fn inline_fragment(&self, type_name: &str) -> InlineFragment {
        InlineFragment::new(type_name, typename_selection_set())
    }

    /// An operation selecting one root field, named after that field.
    ///
    /// Returns `None` if the root type or the field does not exist.
    #[must_use]
    pub fn operation(
        &self,
        field_name: &str,
        operation: OperationType,
    ) -> Option<OperationDefinition> {
        let root = self.cx.schema.root_type(operation)?;
        let definition = root.fields.get(field_name)?;
        let selection = self.selection(definition, None);
        Some(OperationDefinition::new(
            operation,
            Some(Name::new(field_name)),
            SelectionSet::new(vec![selection.into()]),
        ))
    }
}

fn typename_selection_set() -> SelectionSet {
    SelectionSet::new(vec![Field::new(TYPENAME_FIELD).into()])
}

/// Synthesizes the full default query text for a root field.
///
/// Returns an empty string when the field does not exist on the root type.
#[must_use]
pub fn synthesize_operation(
    cx: Context<'_>,
    field_name: &str,
    operation: OperationType,
    options: &FormatOptions,
) -> String {
    let Some(definition) = cx.synthesizer().operation(field_name, operation) else {
        debug!(field = field_name, %operation, "no such root field");
        return String::new();
    };
    let document = Document::new(vec![Definition::Operation(Arc::new(definition))]);
    let printed = print(&document);
    match format(&printed, options) {
        Ok(text) => text,
        Err(err) => {
            debug!(%err, "synthesized operation did not re-parse");
            printed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hooks;
    use pretty_assertions::assert_eq;
    use treeql_schema::{ScalarKinds, Schema};

    const SDL: &str = r#"
        type Query {
          user(id: ID!, limit: Int, role: Role): User
          search(filter: [Filter!]!): [User]
          ping: Boolean
        }
        type Mutation {
          signUp(company: CompanyInput!): Boolean
        }
        type User { id: ID! name: String }
        enum Role { ADMIN USER }
        input CompanyInput { name: String! size: Int address: Address }
        input Address { city: String! zip: String }
        input Filter { term: String! exact: Boolean! }
        input Tree { label: String! child: Tree! }
    "#;

    fn schema() -> Schema {
        Schema::parse(SDL).unwrap()
    }

    fn synthesize(schema: &Schema, hooks: &Hooks, field: &str, op: OperationType) -> String {
        let scalars = ScalarKinds::default();
        let cx = Context::new(schema, hooks, &scalars);
        synthesize_operation(cx, field, op, &FormatOptions::default())
    }

    #[test]
    fn test_mutation_with_required_input() {
        let schema = schema();
        let text = synthesize(&schema, &Hooks::new(), "signUp", OperationType::Mutation);
        assert_eq!(text, "mutation signUp {\n  signUp(company: { name: \"\" })\n}\n");
    }

    #[test]
    fn test_optional_arguments_are_left_out() {
        let schema = schema();
        let text = synthesize(&schema, &Hooks::new(), "user", OperationType::Query);
        assert_eq!(
            text,
            "query user {\n  user(id: \"\") {\n    __typename\n  }\n}\n"
        );
    }

    #[test]
    fn test_list_arguments_get_one_row() {
        let schema = schema();
        let text = synthesize(&schema, &Hooks::new(), "search", OperationType::Query);
        assert_eq!(
            text,
            "query search {\n  search(filter: [{ exact: true, term: \"\" }]) {\n    __typename\n  }\n}\n"
        );
    }

    #[test]
    fn test_missing_field_is_empty() {
        let schema = schema();
        assert_eq!(synthesize(&schema, &Hooks::new(), "nope", OperationType::Query), "");
        assert_eq!(
            synthesize(&schema, &Hooks::new(), "ping", OperationType::Subscription),
            ""
        );
    }

    #[test]
    fn test_override_selects_optional_branches() {
        let schema = schema();
        let hooks = Hooks::new().with_default_value(|definition, path| {
            let parent = path.parent.map(|p| p.definition.name());
            match (definition.name.as_str(), parent) {
                ("address", Some("CompanyInput")) => Some(Value::null()),
                ("limit", _) => Some(Value::int(10)),
                _ => None,
            }
        });

        assert_eq!(
            synthesize(&schema, &hooks, "signUp", OperationType::Mutation),
            "mutation signUp {\n  signUp(company: { address: null, name: \"\" })\n}\n"
        );
        assert_eq!(
            synthesize(&schema, &hooks, "user", OperationType::Query),
            "query user {\n  user(id: \"\", limit: 10) {\n    __typename\n  }\n}\n"
        );
    }

    #[test]
    fn test_input_field_path_passes_through_its_type() {
        let schema = schema();
        let hooks = Hooks::new().with_default_value(|definition, path| {
            let owner = path.parent.map(|parent| parent.definition);
            (definition.name == "size"
                && matches!(owner, Some(SchemaDefinition::Type(_)))
                && path.dotted() == "signUp.company.CompanyInput.size")
                .then(|| Value::int(5))
        });

        assert_eq!(
            synthesize(&schema, &hooks, "signUp", OperationType::Mutation),
            "mutation signUp {\n  signUp(company: { name: \"\", size: 5 })\n}\n"
        );
    }

    #[test]
    fn test_default_values_by_kind() {
        let schema = schema();
        let hooks = Hooks::new();
        let scalars = ScalarKinds::default();
        let synthesizer = Context::new(&schema, &hooks, &scalars).synthesizer();
        let user = schema.query_type().unwrap().fields.get("user").unwrap();
        let path = Ancestor::root(SchemaDefinition::Field(user));

        let cases = [
            (TypeRef::named("Int").non_null(), Value::int(0)),
            (TypeRef::named("Float"), Value::int(0)),
            (TypeRef::named("Boolean"), Value::boolean(true)),
            (TypeRef::named("ID"), Value::string("")),
            (TypeRef::named("Role"), Value::null()),
            (
                TypeRef::named("Int").list().non_null(),
                Value::list(vec![Value::int(0)]),
            ),
        ];
        for (ty, expected) in cases {
            assert_eq!(synthesizer.default_value(&ty, &path), expected, "{ty}");
        }
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let schema = schema();
        let hooks = Hooks::new();
        let scalars = ScalarKinds::default();
        let synthesizer = Context::new(&schema, &hooks, &scalars).synthesizer();
        let search = schema.query_type().unwrap().fields.get("search").unwrap();

        assert_eq!(synthesizer.selection(search, None), synthesizer.selection(search, None));
    }

    #[test]
    fn test_self_referential_input_is_bounded() {
        let schema = schema();
        let hooks = Hooks::new();
        let scalars = ScalarKinds::default();
        let synthesizer = Context::new(&schema, &hooks, &scalars)
            .with_max_depth(3)
            .synthesizer();
        let tree = InputValueDefinition::new("tree", TypeRef::named("Tree").non_null());
        let argument = synthesizer.argument(&tree, None);

        let mut depth = 0;
        let mut value = &argument.value;
        while let Some(object) = value.as_object() {
            depth += 1;
            value = &object.field("child").unwrap().value;
        }
        assert_eq!(depth, 3);
        assert_eq!(value, &Value::null());
    }

    #[test]
    fn test_selected_optional_argument() {
        let schema = schema();
        let hooks = Hooks::new();
        let scalars = ScalarKinds::default();
        let synthesizer = Context::new(&schema, &hooks, &scalars).synthesizer();
        let user = schema.query_type().unwrap().fields.get("user").unwrap();
        let limit = user.argument("limit").unwrap();

        let field_path = Ancestor::root(SchemaDefinition::Field(user));
        let argument = synthesizer.argument(limit, Some(&field_path));
        assert_eq!(argument, Argument::new("limit", Value::int(0)));
    }

    #[test]
    fn test_inline_fragment() {
        let schema = schema();
        let hooks = Hooks::new();
        let scalars = ScalarKinds::default();
        let synthesizer = Context::new(&schema, &hooks, &scalars).synthesizer();
        let fragment = synthesizer.inline_fragment("User");
        assert_eq!(fragment.type_condition.unwrap().as_str(), "User");
        assert!(fragment.selection_set.field(TYPENAME_FIELD).is_some());
    }
}
