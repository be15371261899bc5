//! The schema model and the SDL schema builder.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use treeql_syntax as ast;
use treeql_syntax::{parse_document, Definition, Document, OperationType};

use crate::error::SchemaError;
use crate::ty::TypeRef;
use crate::types::{
    EnumType, EnumValueDefinition, FieldDefinition, InputObjectType, InputValueDefinition,
    InterfaceType, ObjectType, ScalarType, TypeDefinition, UnionType,
};

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// A fully resolved, read-only type system.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    query_type: Option<String>,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: IndexMap<String, TypeDefinition>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Creates a schema holding only the built-in scalars.
    #[must_use]
    pub fn new() -> Self {
        let types = BUILTIN_SCALARS
            .iter()
            .map(|name| {
                let scalar = ScalarType {
                    name: (*name).to_string(),
                    description: Some(format!("Built-in {name} scalar")),
                };
                ((*name).to_string(), TypeDefinition::Scalar(scalar))
            })
            .collect();
        Self {
            query_type: None,
            mutation_type: None,
            subscription_type: None,
            types,
        }
    }

    /// Parses SDL text into a schema.
    pub fn parse(sdl: &str) -> Result<Self, SchemaError> {
        let document = parse_document(sdl)?;
        Self::from_document(&document)
    }

    /// Builds a schema from the type system definitions of a parsed document.
    ///
    /// Executable definitions are ignored.
    pub fn from_document(document: &Document) -> Result<Self, SchemaError> {
        let mut builder = SchemaBuilder::default();
        builder.collect(document)?;
        builder.finish()
    }

    /// Adds or replaces a type.
    #[must_use]
    pub fn with_type(mut self, definition: TypeDefinition) -> Self {
        let name = definition.name().to_string();
        if self.root_type_name(OperationType::Query).is_none() && name == "Query" {
            self.query_type = Some(name.clone());
        }
        if self.root_type_name(OperationType::Mutation).is_none() && name == "Mutation" {
            self.mutation_type = Some(name.clone());
        }
        if self.root_type_name(OperationType::Subscription).is_none() && name == "Subscription" {
            self.subscription_type = Some(name.clone());
        }
        self.types.insert(name, definition);
        self
    }

    /// Sets the root type for an operation type.
    #[must_use]
    pub fn with_root(mut self, operation: OperationType, name: impl Into<String>) -> Self {
        *self.root_slot(operation) = Some(name.into());
        self
    }

    fn root_slot(&mut self, operation: OperationType) -> &mut Option<String> {
        match operation {
            OperationType::Query => &mut self.query_type,
            OperationType::Mutation => &mut self.mutation_type,
            OperationType::Subscription => &mut self.subscription_type,
        }
    }

    #[must_use]
    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// All types in definition order, built-in scalars first.
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    #[must_use]
    pub fn root_type_name(&self, operation: OperationType) -> Option<&str> {
        match operation {
            OperationType::Query => self.query_type.as_deref(),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }
    }

    /// The root object type an operation of the given type selects from.
    #[must_use]
    pub fn root_type(&self, operation: OperationType) -> Option<&ObjectType> {
        self.root_type_name(operation)
            .and_then(|name| self.type_definition(name))
            .and_then(TypeDefinition::as_object)
    }

    #[must_use]
    pub fn query_type(&self) -> Option<&ObjectType> {
        self.root_type(OperationType::Query)
    }

    #[must_use]
    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.root_type(OperationType::Mutation)
    }

    #[must_use]
    pub fn subscription_type(&self) -> Option<&ObjectType> {
        self.root_type(OperationType::Subscription)
    }

    /// The named type at the core of a type reference.
    #[must_use]
    pub fn unwrap_type(&self, ty: &TypeRef) -> Option<&TypeDefinition> {
        self.type_definition(ty.named_type())
    }

    /// Object types a value of the given abstract type may have at runtime.
    ///
    /// For an interface these are the implementing objects in schema order, for a
    /// union its members in declaration order, for an object the object itself.
    #[must_use]
    pub fn possible_types(&self, name: &str) -> Vec<&ObjectType> {
        match self.type_definition(name) {
            Some(TypeDefinition::Object(object)) => vec![object],
            Some(TypeDefinition::Interface(_)) => self
                .types
                .values()
                .filter_map(TypeDefinition::as_object)
                .filter(|object| object.interfaces.iter().any(|i| i == name))
                .collect(),
            Some(TypeDefinition::Union(union)) => union
                .members
                .iter()
                .filter_map(|member| self.type_definition(member))
                .filter_map(TypeDefinition::as_object)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns a copy of this schema keeping only the object and interface fields
    /// accepted by `keep(type_name, field)`.
    #[must_use]
    pub fn filter_fields<F>(&self, keep: F) -> Self
    where
        F: Fn(&str, &FieldDefinition) -> bool,
    {
        let mut filtered = self.clone();
        for definition in filtered.types.values_mut() {
            match definition {
                TypeDefinition::Object(ObjectType { name, fields, .. })
                | TypeDefinition::Interface(InterfaceType { name, fields, .. }) => {
                    let type_name = name.as_str();
                    fields.retain(|_, field| keep(type_name, field));
                }
                _ => {}
            }
        }
        filtered
    }
}

/// Collects SDL definitions, then resolves extensions and validates references.
#[derive(Default)]
struct SchemaBuilder {
    schema: Schema,
    declared: FxHashSet<String>,
    extensions: Vec<TypeDefinition>,
    roots: Vec<(OperationType, String)>,
}

impl SchemaBuilder {
    fn collect(&mut self, document: &Document) -> Result<(), SchemaError> {
        for definition in &document.definitions {
            match definition {
                Definition::Type(definition) => {
                    let converted = convert_type(definition);
                    if definition.extension {
                        self.extensions.push(converted);
                        continue;
                    }
                    let name = converted.name().to_string();
                    if !self.declared.insert(name.clone()) {
                        return Err(SchemaError::DuplicateType(name));
                    }
                    self.schema.types.insert(name, converted);
                }
                Definition::Schema(schema) => {
                    for root in &schema.root_operations {
                        self.roots
                            .push((root.operation, root.named_type.value.clone()));
                    }
                }
                Definition::Operation(_) | Definition::Fragment(_) | Definition::Directive(_) => {}
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Schema, SchemaError> {
        for extension in std::mem::take(&mut self.extensions) {
            let name = extension.name().to_string();
            let base = self
                .schema
                .types
                .get_mut(&name)
                .ok_or_else(|| SchemaError::UnknownExtension(name.clone()))?;
            extend(base, extension)?;
        }

        let mut schema = self.schema;
        if self.roots.is_empty() {
            for (operation, name) in [
                (OperationType::Query, "Query"),
                (OperationType::Mutation, "Mutation"),
                (OperationType::Subscription, "Subscription"),
            ] {
                if schema.types.contains_key(name) {
                    *schema.root_slot(operation) = Some(name.to_string());
                }
            }
        } else {
            for (operation, name) in self.roots {
                *schema.root_slot(operation) = Some(name);
            }
        }

        validate(&schema)?;
        Ok(schema)
    }
}

/// Merges an extension into its base definition.
fn extend(base: &mut TypeDefinition, extension: TypeDefinition) -> Result<(), SchemaError> {
    match (base, extension) {
        (TypeDefinition::Scalar(_), TypeDefinition::Scalar(_)) => {}
        (TypeDefinition::Object(base), TypeDefinition::Object(extension)) => {
            merge_names(&mut base.interfaces, extension.interfaces);
            base.fields.extend(extension.fields);
        }
        (TypeDefinition::Interface(base), TypeDefinition::Interface(extension)) => {
            merge_names(&mut base.interfaces, extension.interfaces);
            base.fields.extend(extension.fields);
        }
        (TypeDefinition::Union(base), TypeDefinition::Union(extension)) => {
            merge_names(&mut base.members, extension.members);
        }
        (TypeDefinition::Enum(base), TypeDefinition::Enum(extension)) => {
            for value in extension.values {
                if !base.values.iter().any(|v| v.name == value.name) {
                    base.values.push(value);
                }
            }
        }
        (TypeDefinition::InputObject(base), TypeDefinition::InputObject(extension)) => {
            base.fields.extend(extension.fields);
        }
        (base, extension) => {
            return Err(SchemaError::ExtensionKindMismatch {
                name: base.name().to_string(),
                expected: extension.keyword(),
                found: base.keyword(),
            });
        }
    }
    Ok(())
}

fn merge_names(names: &mut Vec<String>, more: Vec<String>) {
    for name in more {
        if !names.contains(&name) {
            names.push(name);
        }
    }
}

fn validate(schema: &Schema) -> Result<(), SchemaError> {
    for operation in [
        OperationType::Query,
        OperationType::Mutation,
        OperationType::Subscription,
    ] {
        let Some(name) = schema.root_type_name(operation) else {
            continue;
        };
        match schema.type_definition(name) {
            Some(TypeDefinition::Object(_)) => {}
            Some(_) => {
                return Err(SchemaError::InvalidRootType {
                    operation,
                    name: name.to_string(),
                })
            }
            None => {
                return Err(SchemaError::UnknownType {
                    name: name.to_string(),
                    referenced_by: format!("schema.{operation}"),
                })
            }
        }
    }

    for definition in schema.types.values() {
        let owner = definition.name();
        match definition {
            TypeDefinition::Object(ObjectType {
                interfaces, fields, ..
            })
            | TypeDefinition::Interface(InterfaceType {
                interfaces, fields, ..
            }) => {
                for interface in interfaces {
                    expect_known(schema, interface, owner)?;
                }
                for field in fields.values() {
                    let path = format!("{owner}.{}", field.name);
                    let target = expect_known(schema, field.ty.named_type(), &path)?;
                    if matches!(target, TypeDefinition::InputObject(_)) {
                        return Err(SchemaError::ExpectedOutputType {
                            name: field.ty.to_string(),
                            referenced_by: path,
                        });
                    }
                    for argument in &field.arguments {
                        validate_input(schema, argument, &format!("{path}({})", argument.name))?;
                    }
                }
            }
            TypeDefinition::Union(union) => {
                for member in &union.members {
                    expect_known(schema, member, owner)?;
                }
            }
            TypeDefinition::InputObject(input) => {
                for field in input.fields.values() {
                    validate_input(schema, field, &format!("{owner}.{}", field.name))?;
                }
            }
            TypeDefinition::Scalar(_) | TypeDefinition::Enum(_) => {}
        }
    }
    Ok(())
}

fn validate_input(
    schema: &Schema,
    input: &InputValueDefinition,
    path: &str,
) -> Result<(), SchemaError> {
    let target = expect_known(schema, input.ty.named_type(), path)?;
    if target.is_input_type() {
        Ok(())
    } else {
        Err(SchemaError::ExpectedInputType {
            name: input.ty.to_string(),
            referenced_by: path.to_string(),
        })
    }
}

fn expect_known<'a>(
    schema: &'a Schema,
    name: &str,
    referenced_by: &str,
) -> Result<&'a TypeDefinition, SchemaError> {
    schema
        .type_definition(name)
        .ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
}

// =============================================================================
// Syntax conversion
// =============================================================================

fn convert_type(definition: &ast::TypeDefinition) -> TypeDefinition {
    let name = definition.name.value.clone();
    let description = definition.description.clone();
    match &definition.kind {
        ast::TypeDefinitionKind::Scalar => TypeDefinition::Scalar(ScalarType { name, description }),
        ast::TypeDefinitionKind::Object { interfaces, fields } => {
            TypeDefinition::Object(ObjectType {
                name,
                description,
                interfaces: names(interfaces),
                fields: convert_fields(fields),
            })
        }
        ast::TypeDefinitionKind::Interface { interfaces, fields } => {
            TypeDefinition::Interface(InterfaceType {
                name,
                description,
                interfaces: names(interfaces),
                fields: convert_fields(fields),
            })
        }
        ast::TypeDefinitionKind::Union { members } => TypeDefinition::Union(UnionType {
            name,
            description,
            members: names(members),
        }),
        ast::TypeDefinitionKind::Enum { values } => TypeDefinition::Enum(EnumType {
            name,
            description,
            values: values
                .iter()
                .map(|value| EnumValueDefinition {
                    name: value.name.value.clone(),
                    description: value.description.clone(),
                })
                .collect(),
        }),
        ast::TypeDefinitionKind::InputObject { fields } => {
            TypeDefinition::InputObject(InputObjectType {
                name,
                description,
                fields: fields
                    .iter()
                    .map(|field| (field.name.value.clone(), convert_input_value(field)))
                    .collect(),
            })
        }
    }
}

fn names(names: &[ast::Name]) -> Vec<String> {
    names.iter().map(|name| name.value.clone()).collect()
}

fn convert_fields(fields: &[ast::FieldDefinition]) -> IndexMap<String, FieldDefinition> {
    fields
        .iter()
        .map(|field| {
            let converted = FieldDefinition {
                name: field.name.value.clone(),
                description: field.description.clone(),
                arguments: field.arguments.iter().map(convert_input_value).collect(),
                ty: TypeRef::from(&field.ty),
            };
            (converted.name.clone(), converted)
        })
        .collect()
}

fn convert_input_value(value: &ast::InputValueDefinition) -> InputValueDefinition {
    InputValueDefinition {
        name: value.name.value.clone(),
        description: value.description.clone(),
        ty: TypeRef::from(&value.ty),
        default_value: value.default_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use treeql_syntax::Value;

    const SDL: &str = r#"
        "The query root"
        type Query {
          node(id: ID!): Node
          user(id: ID!, first: Int = 10): User
          search(term: String): SearchResult
        }

        type Mutation {
          signUp(company: CompanyInput!): Boolean
        }

        interface Node {
          id: ID!
        }

        type User implements Node {
          id: ID!
          name: String
        }

        type Org implements Node {
          id: ID!
          members: [User!]!
        }

        union SearchResult = User | Org

        input CompanyInput {
          name: String!
          size: Int
        }
    "#;

    #[test]
    fn test_parse_roots() {
        let schema = Schema::parse(SDL).unwrap();
        assert_eq!(schema.query_type().unwrap().name, "Query");
        assert_eq!(schema.mutation_type().unwrap().name, "Mutation");
        assert!(schema.subscription_type().is_none());
        assert_eq!(
            schema.type_definition("Query").unwrap().description(),
            Some("The query root")
        );
    }

    #[test]
    fn test_builtin_scalars() {
        let schema = Schema::parse(SDL).unwrap();
        let int = schema.type_definition("Int").unwrap();
        assert_eq!(int.description(), Some("Built-in Int scalar"));
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = Schema::parse(SDL).unwrap();
        let names: Vec<_> = schema.query_type().unwrap().fields.keys().cloned().collect();
        assert_eq!(names, ["node", "user", "search"]);
    }

    #[test]
    fn test_argument_required_ness() {
        let schema = Schema::parse(SDL).unwrap();
        let user = &schema.query_type().unwrap().fields["user"];
        assert!(user.argument("id").unwrap().is_required());
        let first = user.argument("first").unwrap();
        assert!(!first.is_required());
        assert_eq!(first.default_value, Some(Value::int(10)));
    }

    #[test]
    fn test_possible_types() {
        let schema = Schema::parse(SDL).unwrap();
        let names = |ty: &str| -> Vec<String> {
            schema
                .possible_types(ty)
                .into_iter()
                .map(|object| object.name.clone())
                .collect()
        };
        assert_eq!(names("Node"), ["User", "Org"]);
        assert_eq!(names("SearchResult"), ["User", "Org"]);
        assert_eq!(names("User"), ["User"]);
        assert!(names("Int").is_empty());
    }

    #[test]
    fn test_unwrap_type() {
        let schema = Schema::parse(SDL).unwrap();
        let members = &schema.type_definition("Org").unwrap().field("members").unwrap().ty;
        assert!(members.has_list());
        assert_eq!(schema.unwrap_type(members).unwrap().name(), "User");
    }

    #[test]
    fn test_filter_fields_is_pure() {
        let schema = Schema::parse(SDL).unwrap();
        let filtered = schema.filter_fields(|ty, field| ty != "Query" || field.name == "user");

        let kept: Vec<_> = filtered.query_type().unwrap().fields.keys().cloned().collect();
        assert_eq!(kept, ["user"]);
        assert_eq!(schema.query_type().unwrap().fields.len(), 3);
        assert!(filtered.mutation_type().unwrap().fields.contains_key("signUp"));
    }

    #[test]
    fn test_schema_definition_overrides_roots() {
        let schema = Schema::parse(
            "schema { query: Root subscription: Events }
             type Root { ok: Boolean }
             type Events { tick: Int }
             type Query { unused: Int }",
        )
        .unwrap();
        assert_eq!(schema.query_type().unwrap().name, "Root");
        assert_eq!(schema.subscription_type().unwrap().name, "Events");
        assert!(schema.mutation_type().is_none());
    }

    #[test]
    fn test_extensions_merge() {
        let schema = Schema::parse(
            "type Query { a: Int }
             extend type Query { b: String }
             enum Role { ADMIN }
             extend enum Role { USER ADMIN }",
        )
        .unwrap();
        let fields: Vec<_> = schema.query_type().unwrap().fields.keys().cloned().collect();
        assert_eq!(fields, ["a", "b"]);
        let role = schema.type_definition("Role").unwrap().as_enum().unwrap();
        assert_eq!(role.value_names().collect::<Vec<_>>(), ["ADMIN", "USER"]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Schema::parse("type A { a: Int } type A { b: Int }"),
            Err(SchemaError::DuplicateType(name)) if name == "A"
        ));
        assert!(matches!(
            Schema::parse("type Query { a: Missing }"),
            Err(SchemaError::UnknownType { name, referenced_by })
                if name == "Missing" && referenced_by == "Query.a"
        ));
        assert!(matches!(
            Schema::parse("extend type Query { a: Int }"),
            Err(SchemaError::UnknownExtension(name)) if name == "Query"
        ));
        assert!(matches!(
            Schema::parse("type Query { a: Int } extend input Query { b: Int }"),
            Err(SchemaError::ExtensionKindMismatch { .. })
        ));
        assert!(matches!(
            Schema::parse("schema { query: Q } input Q { a: Int }"),
            Err(SchemaError::InvalidRootType { .. })
        ));
        assert!(matches!(
            Schema::parse("type Query { a(u: User): Int } type User { id: ID }"),
            Err(SchemaError::ExpectedInputType { referenced_by, .. }) if referenced_by == "Query.a(u)"
        ));
        assert!(matches!(
            Schema::parse("type Query { a: In } input In { id: ID }"),
            Err(SchemaError::ExpectedOutputType { .. })
        ));
        assert!(matches!(Schema::parse("type Query {"), Err(SchemaError::Syntax(_))));
    }

    #[test]
    fn test_builder() {
        let schema = Schema::new().with_type(TypeDefinition::Object(ObjectType {
            name: "Query".to_string(),
            description: None,
            interfaces: Vec::new(),
            fields: IndexMap::new(),
        }));
        assert_eq!(schema.root_type_name(OperationType::Query), Some("Query"));
    }
}
