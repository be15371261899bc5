//! Ancestor paths threaded through synthesis and rendering.

use treeql_schema::{FieldDefinition, InputValueDefinition, TypeDefinition, TypeRef};

/// A schema definition on an ancestor path.
#[derive(Debug, Clone, Copy)]
pub enum SchemaDefinition<'a> {
    Field(&'a FieldDefinition),
    Argument(&'a InputValueDefinition),
    InputField(&'a InputValueDefinition),
    Type(&'a TypeDefinition),
}

impl<'a> SchemaDefinition<'a> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        match self {
            Self::Field(field) => &field.name,
            Self::Argument(input) | Self::InputField(input) => &input.name,
            Self::Type(ty) => ty.name(),
        }
    }

    /// The declared type, `None` for named types themselves.
    #[must_use]
    pub fn ty(&self) -> Option<&'a TypeRef> {
        match self {
            Self::Field(field) => Some(&field.ty),
            Self::Argument(input) | Self::InputField(input) => Some(&input.ty),
            Self::Type(_) => None,
        }
    }
}

/// A borrowed, singly linked path from a definition up to the root.
///
/// The tree never owns or indexes its parents; each recursion level pushes a
/// child onto its own stack frame.
#[derive(Debug, Clone, Copy)]
pub struct Ancestor<'a> {
    pub definition: SchemaDefinition<'a>,
    pub parent: Option<&'a Ancestor<'a>>,
}

impl<'a> Ancestor<'a> {
    #[must_use]
    pub const fn root(definition: SchemaDefinition<'a>) -> Self {
        Self {
            definition,
            parent: None,
        }
    }

    /// Extends this path by one definition.
    #[must_use]
    pub fn child<'b>(&'b self, definition: SchemaDefinition<'b>) -> Ancestor<'b> {
        Ancestor {
            definition,
            parent: Some(self),
        }
    }

    /// Extends an optional path, starting a new one at the root.
    #[must_use]
    pub fn extend<'b>(parent: Option<&'b Ancestor<'b>>, definition: SchemaDefinition<'b>) -> Ancestor<'b> {
        Ancestor { definition, parent }
    }

    /// Definitions from this one up to the root.
    pub fn iter(&self) -> impl Iterator<Item = SchemaDefinition<'_>> + '_ {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.parent;
            Some(current.definition)
        })
    }

    /// Number of definitions on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// A path is never empty; it always holds at least its own definition.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Names from the root down, joined with dots: `signUp.company.name`.
    #[must_use]
    pub fn dotted(&self) -> String {
        let mut names: Vec<&str> = self.iter().map(|definition| definition.name()).collect();
        names.reverse();
        names.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_walks_to_root() {
        let field = FieldDefinition::new("signUp", TypeRef::named("Boolean"));
        let company = InputValueDefinition::new("company", TypeRef::named("CompanyInput"));
        let name = InputValueDefinition::new("name", TypeRef::named("String").non_null());

        let root = Ancestor::root(SchemaDefinition::Field(&field));
        let argument = root.child(SchemaDefinition::Argument(&company));
        let input = argument.child(SchemaDefinition::InputField(&name));

        let names: Vec<_> = input.iter().map(|definition| definition.name()).collect();
        assert_eq!(names, ["name", "company", "signUp"]);
        assert_eq!(input.len(), 3);
        assert_eq!(input.dotted(), "signUp.company.name");
        assert!(matches!(input.definition, SchemaDefinition::InputField(_)));
        assert_eq!(input.definition.ty().map(ToString::to_string).as_deref(), Some("String!"));
    }

    #[test]
    fn test_extend_without_parent() {
        let id = InputValueDefinition::new("id", TypeRef::named("ID"));
        let path = Ancestor::extend(None, SchemaDefinition::Argument(&id));
        assert!(path.parent.is_none());
        assert_eq!(path.dotted(), "id");
    }
}
