//! Type references and unwrapping.

use std::fmt;

use treeql_syntax::Type;

/// A reference to a type, possibly wrapped in list and non-null modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[must_use]
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    #[must_use]
    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    /// The name of the innermost named type, with every wrapper stripped.
    #[must_use]
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }

    /// Returns true if any list wrapper appears at any depth.
    #[must_use]
    pub fn has_list(&self) -> bool {
        match self {
            Self::Named(_) => false,
            Self::List(_) => true,
            Self::NonNull(inner) => inner.has_list(),
        }
    }

    #[must_use]
    pub const fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// This type with one outer non-null wrapper removed.
    #[must_use]
    pub fn nullable(&self) -> &Self {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }

    /// The element type if this is a (possibly non-null) list.
    #[must_use]
    pub fn item_type(&self) -> Option<&Self> {
        match self.nullable() {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl From<&Type> for TypeRef {
    fn from(ty: &Type) -> Self {
        match ty {
            Type::Named(name) => Self::Named(name.value.clone()),
            Type::List(inner) => Self::List(Box::new(Self::from(inner.as_ref()))),
            Type::NonNull(inner) => Self::NonNull(Box::new(Self::from(inner.as_ref()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_type_strips_all_wrappers() {
        let ty = TypeRef::named("User").non_null().list().non_null();
        assert_eq!(ty.named_type(), "User");
        assert_eq!(ty.to_string(), "[User!]!");
    }

    #[test]
    fn test_has_list() {
        assert!(!TypeRef::named("Int").non_null().has_list());
        assert!(TypeRef::named("Int").list().has_list());
        assert!(TypeRef::named("Int").list().non_null().has_list());
    }

    #[test]
    fn test_item_type() {
        let ty = TypeRef::named("Int").non_null().list().non_null();
        assert_eq!(ty.item_type(), Some(&TypeRef::named("Int").non_null()));
        assert_eq!(TypeRef::named("Int").item_type(), None);
    }

    #[test]
    fn test_from_syntax_type() {
        let ty = Type::named("ID").non_null().list();
        assert_eq!(TypeRef::from(&ty).to_string(), "[ID!]");
    }
}
