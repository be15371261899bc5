//! Scalar classification.
//!
//! GraphQL carries no signal that tells a numeric custom scalar apart from a
//! string-like one, so the classification is configuration: a list of scalar
//! names per kind. Anything not listed is string-like.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use treeql_syntax::lexer::tokenize;
use treeql_syntax::{TokenKind, Value};

use crate::types::TypeDefinition;

/// How a scalar's values are written and defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScalarKind {
    Boolean,
    Int,
    Float,
    String,
}

/// Scalar names grouped by [`ScalarKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ScalarKinds {
    pub boolean: Vec<String>,
    pub int: Vec<String>,
    pub float: Vec<String>,
}

impl Default for ScalarKinds {
    fn default() -> Self {
        Self {
            boolean: vec!["Boolean".to_string()],
            int: vec!["Int".to_string(), "Long".to_string()],
            float: vec!["Float".to_string(), "BigDecimal".to_string()],
        }
    }
}

impl ScalarKinds {
    #[must_use]
    pub fn with_boolean(mut self, name: impl Into<String>) -> Self {
        self.boolean.push(name.into());
        self
    }

    #[must_use]
    pub fn with_int(mut self, name: impl Into<String>) -> Self {
        self.int.push(name.into());
        self
    }

    #[must_use]
    pub fn with_float(mut self, name: impl Into<String>) -> Self {
        self.float.push(name.into());
        self
    }

    #[must_use]
    pub fn classify(&self, name: &str) -> ScalarKind {
        let listed = |names: &[String]| names.iter().any(|n| n == name);
        if listed(&self.boolean) {
            ScalarKind::Boolean
        } else if listed(&self.int) {
            ScalarKind::Int
        } else if listed(&self.float) {
            ScalarKind::Float
        } else {
            ScalarKind::String
        }
    }

    #[must_use]
    pub fn is_numeric(&self, name: &str) -> bool {
        matches!(self.classify(name), ScalarKind::Int | ScalarKind::Float)
    }

    /// The zero value for a scalar: `true`, `0` or `""`.
    #[must_use]
    pub fn default_value(&self, name: &str) -> Value {
        match self.classify(name) {
            ScalarKind::Boolean => Value::boolean(true),
            ScalarKind::Int | ScalarKind::Float => Value::int(0),
            ScalarKind::String => Value::string(""),
        }
    }

    /// Converts text typed into a leaf editor into a value of the given type.
    ///
    /// Returns `None` when the type has no text editor (objects, input objects).
    /// Text that is not a valid literal of the type yields `null`, the transient
    /// state while the user is still typing.
    #[must_use]
    pub fn value_from_input(&self, definition: &TypeDefinition, text: &str) -> Option<Value> {
        match definition {
            TypeDefinition::Enum(_) => Some(match single_token(text) {
                Some(TokenKind::Name) if !is_reserved(text.trim()) => {
                    Value::enum_value(text.trim())
                }
                _ => Value::null(),
            }),
            TypeDefinition::Scalar(scalar) => Some(match self.classify(&scalar.name) {
                ScalarKind::Boolean => match text.trim() {
                    "true" => Value::boolean(true),
                    "false" => Value::boolean(false),
                    _ => Value::null(),
                },
                ScalarKind::Int => match single_token(text) {
                    Some(TokenKind::IntLiteral) => int_literal(text.trim()),
                    _ => Value::null(),
                },
                ScalarKind::Float => match single_token(text) {
                    Some(TokenKind::IntLiteral) => int_literal(text.trim()),
                    Some(TokenKind::FloatLiteral) => Value::float(text.trim()),
                    _ => Value::null(),
                },
                ScalarKind::String => Value::string(text),
            }),
            _ => None,
        }
    }
}

/// `true`, `false` and `null` are not enum values.
fn is_reserved(name: &str) -> bool {
    matches!(name, "true" | "false" | "null")
}

fn int_literal(text: &str) -> Value {
    Value::Int(treeql_syntax::IntValue {
        value: text.to_string(),
        loc: None,
    })
}

/// The kind of the only token in `text`, ignoring surrounding whitespace.
fn single_token(text: &str) -> Option<TokenKind> {
    let trimmed = text.trim();
    let tokens = tokenize(trimmed);
    match tokens.as_slice() {
        [token, eof] if eof.is_eof() => {
            let covers = token.span.start == 0 && token.span.end as usize == trimmed.len();
            covers.then_some(token.kind)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumType, InputObjectType, ScalarType};
    use indexmap::IndexMap;

    fn scalar(name: &str) -> TypeDefinition {
        TypeDefinition::Scalar(ScalarType {
            name: name.to_string(),
            description: None,
        })
    }

    #[test]
    fn test_default_classification() {
        let kinds = ScalarKinds::default();
        assert_eq!(kinds.classify("Boolean"), ScalarKind::Boolean);
        assert_eq!(kinds.classify("Long"), ScalarKind::Int);
        assert_eq!(kinds.classify("BigDecimal"), ScalarKind::Float);
        assert_eq!(kinds.classify("ID"), ScalarKind::String);
        assert_eq!(kinds.classify("DateTime"), ScalarKind::String);
        assert!(kinds.is_numeric("Int"));
        assert!(!kinds.is_numeric("String"));
    }

    #[test]
    fn test_custom_classification() {
        let kinds = ScalarKinds::default().with_int("Cents").with_boolean("Flag");
        assert_eq!(kinds.classify("Cents"), ScalarKind::Int);
        assert_eq!(kinds.default_value("Flag"), Value::boolean(true));
    }

    #[test]
    fn test_default_values() {
        let kinds = ScalarKinds::default();
        assert_eq!(kinds.default_value("Boolean"), Value::boolean(true));
        assert_eq!(kinds.default_value("Float"), Value::int(0));
        assert_eq!(kinds.default_value("String"), Value::string(""));
        assert_eq!(kinds.default_value("Upload"), Value::string(""));
    }

    #[test]
    fn test_numeric_input() {
        let kinds = ScalarKinds::default();
        let int = scalar("Int");
        let float = scalar("Float");

        assert_eq!(kinds.value_from_input(&int, "42"), Some(Value::int(42)));
        assert_eq!(kinds.value_from_input(&int, " -7 "), Some(Value::int(-7)));
        assert_eq!(kinds.value_from_input(&int, "4.2"), Some(Value::null()));
        assert_eq!(kinds.value_from_input(&int, ""), Some(Value::null()));
        assert_eq!(kinds.value_from_input(&int, "12abc"), Some(Value::null()));
        assert_eq!(kinds.value_from_input(&int, "1, 2"), Some(Value::null()));
        assert_eq!(kinds.value_from_input(&float, "4.2"), Some(Value::float("4.2")));
        assert_eq!(kinds.value_from_input(&float, "3"), Some(Value::int(3)));
    }

    #[test]
    fn test_boolean_and_string_input() {
        let kinds = ScalarKinds::default();
        let boolean = scalar("Boolean");
        let string = scalar("String");

        assert_eq!(kinds.value_from_input(&boolean, "false"), Some(Value::boolean(false)));
        assert_eq!(kinds.value_from_input(&boolean, "yes"), Some(Value::null()));
        assert_eq!(
            kinds.value_from_input(&string, " hello "),
            Some(Value::string(" hello "))
        );
    }

    #[test]
    fn test_enum_and_object_input() {
        let kinds = ScalarKinds::default();
        let role = TypeDefinition::Enum(EnumType {
            name: "Role".to_string(),
            description: None,
            values: Vec::new(),
        });
        let input = TypeDefinition::InputObject(InputObjectType {
            name: "UserInput".to_string(),
            description: None,
            fields: IndexMap::new(),
        });

        assert_eq!(kinds.value_from_input(&role, "ADMIN"), Some(Value::enum_value("ADMIN")));
        assert_eq!(kinds.value_from_input(&role, ""), Some(Value::null()));
        assert_eq!(kinds.value_from_input(&role, "null"), Some(Value::null()));
        assert_eq!(kinds.value_from_input(&input, "x"), None);
    }
}
