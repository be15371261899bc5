//! Recursive descent parser for GraphQL documents.

use std::sync::Arc;

use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{block_string_value, string_value, Lexer};
use crate::token::{Token, TokenKind};
use treeql_core::{diagnostics::codes, DiagnosticBag, Location, Span};

/// Parser for GraphQL.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    source: Arc<str>,
    current: Token,
    /// End of the last consumed token, used to close node spans.
    prev_end: u32,
    diagnostics: DiagnosticBag,
}

/// Result of parsing.
pub struct ParseResult {
    pub document: Document,
    pub diagnostics: DiagnosticBag,
}

/// Parses a source string into a document, collecting diagnostics.
pub fn parse(source: &str) -> ParseResult {
    let mut parser = Parser::new(source);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

/// Parses a source string, failing on the first syntax error.
pub fn parse_document(source: &str) -> Result<Document, SyntaxError> {
    let result = parse(source);
    match SyntaxError::first_in(&result.diagnostics, source) {
        Some(error) => Err(error),
        None => Ok(result.document),
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(source),
            source: Arc::from(source),
            current: Token::new(TokenKind::Eof, Span::empty(0)),
            prev_end: 0,
            diagnostics: DiagnosticBag::new(),
        };
        parser.bump();
        parser
    }

    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Returns true if the current token is the given contextual keyword.
    fn at_keyword(&self, keyword: &str) -> bool {
        self.at_kind(TokenKind::Name) && self.current_text() == keyword
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.prev_end = self.current.span.end;
        self.bump();
    }

    /// Pulls the next significant token, reporting lexer errors on the way.
    fn bump(&mut self) {
        loop {
            self.current = self.lexer.next_token();
            if !self.at_kind(TokenKind::Error) {
                break;
            }
            let text = self.current_text();
            let (code, message) = if text.starts_with('"') {
                (codes::UNTERMINATED_STRING, "unterminated string".to_string())
            } else {
                (codes::INVALID_SYNTAX, format!("unexpected character `{text}`"))
            };
            self.diagnostics
                .error(code, "invalid token", self.current.span, message);
        }
    }

    /// Expects a specific token kind.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            self.error_expected(kind.as_str());
            false
        }
    }

    /// Expects a contextual keyword.
    fn expect_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            self.error_expected(keyword);
            false
        }
    }

    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    /// Location from `start` to the end of the last consumed token.
    fn loc(&self, start: u32) -> Option<Location> {
        let end = self.prev_end.max(start);
        Some(Location::new(Span::new(start, end), Arc::clone(&self.source)))
    }

    fn error(&mut self, message: &str) {
        self.diagnostics.error(
            codes::INVALID_SYNTAX,
            message,
            self.current.span,
            message.to_string(),
        );
    }

    fn error_expected(&mut self, expected: &str) {
        if self.at_kind(TokenKind::Eof) {
            self.diagnostics.error(
                codes::UNEXPECTED_EOF,
                "unexpected end of input",
                self.current.span,
                format!("expected {expected}"),
            );
        } else {
            let found = self.current_text();
            self.diagnostics.error(
                codes::UNEXPECTED_TOKEN,
                "unexpected token",
                self.current.span,
                format!("expected {expected}, found `{found}`"),
            );
        }
    }

    /// Skips the current token if the last parse step consumed nothing.
    fn ensure_progress(&mut self, before: u32) {
        if self.current.span.start == before && !self.at_kind(TokenKind::Eof) {
            self.advance();
        }
    }

    /// Parses a whole document.
    pub fn parse_document(&mut self) -> Document {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        while !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            }
            self.ensure_progress(before);
        }

        Document {
            definitions,
            loc: self.loc(start),
        }
    }

    fn parse_definition(&mut self) -> Option<Definition> {
        if self.at_kind(TokenKind::LBrace) {
            return Some(Definition::Operation(Arc::new(self.parse_operation())));
        }

        let start = self.current.span.start;
        let description = self.parse_description();

        if !self.at_kind(TokenKind::Name) {
            self.error_expected("definition");
            return None;
        }

        match self.current_text() {
            "query" | "mutation" | "subscription" => {
                Some(Definition::Operation(Arc::new(self.parse_operation())))
            }
            "fragment" => Some(Definition::Fragment(Arc::new(
                self.parse_fragment_definition(),
            ))),
            "schema" => Some(Definition::Schema(Arc::new(
                self.parse_schema_definition(start, description, false),
            ))),
            "directive" => Some(Definition::Directive(Arc::new(
                self.parse_directive_definition(start, description),
            ))),
            "extend" => {
                self.advance();
                if self.at_keyword("schema") {
                    Some(Definition::Schema(Arc::new(
                        self.parse_schema_definition(start, description, true),
                    )))
                } else {
                    self.parse_type_definition(start, description, true)
                        .map(|def| Definition::Type(Arc::new(def)))
                }
            }
            _ => self
                .parse_type_definition(start, description, false)
                .map(|def| Definition::Type(Arc::new(def))),
        }
    }

    fn parse_description(&mut self) -> Option<String> {
        let value = match self.at() {
            TokenKind::StringLiteral => self.parse_string_literal(),
            TokenKind::BlockStringLiteral => block_string_value(self.current_text()),
            _ => return None,
        };
        self.advance();
        Some(value)
    }

    /// Decodes the current string literal, reporting bad escapes.
    fn parse_string_literal(&mut self) -> String {
        let raw = self.current_text();
        if let Some(value) = string_value(raw) {
            value
        } else {
            self.diagnostics.error(
                codes::INVALID_ESCAPE,
                "invalid escape sequence",
                self.current.span,
                "invalid escape sequence in string",
            );
            raw.trim_matches('"').to_string()
        }
    }

    fn parse_name(&mut self) -> Name {
        let start = self.current.span.start;
        if self.at_kind(TokenKind::Name) {
            let value = self.current_text().to_string();
            self.advance();
            Name {
                value,
                loc: self.loc(start),
            }
        } else {
            self.error_expected("name");
            Name::new("")
        }
    }

    // =========================================================================
    // Executable definitions
    // =========================================================================

    fn parse_operation(&mut self) -> OperationDefinition {
        let start = self.current.span.start;

        let (operation, name) = if self.at_kind(TokenKind::LBrace) {
            (OperationType::Query, None)
        } else {
            let operation =
                OperationType::from_keyword(self.current_text()).unwrap_or_default();
            self.advance();
            let name = self.at_kind(TokenKind::Name).then(|| self.parse_name());
            (operation, name)
        };

        let variable_definitions = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let mut vars = Vec::new();
            while !self.at_kind(TokenKind::RParen) && !self.at_kind(TokenKind::Eof) {
                let before = self.current.span.start;
                vars.push(Arc::new(self.parse_variable_definition()));
                self.ensure_progress(before);
            }
            self.expect(TokenKind::RParen);
            vars
        } else {
            Vec::new()
        };

        let directives = self.parse_directives();
        let selection_set = self.parse_selection_set();

        OperationDefinition {
            operation,
            name,
            variable_definitions,
            directives,
            selection_set: Arc::new(selection_set),
            loc: self.loc(start),
        }
    }

    fn parse_variable(&mut self) -> Variable {
        let start = self.current.span.start;
        self.expect(TokenKind::Dollar);
        let name = self.parse_name();
        Variable {
            name,
            loc: self.loc(start),
        }
    }

    fn parse_variable_definition(&mut self) -> VariableDefinition {
        let start = self.current.span.start;
        let variable = self.parse_variable();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.at_kind(TokenKind::Eq) {
            self.advance();
            Some(self.parse_value())
        } else {
            None
        };

        let directives = self.parse_directives();

        VariableDefinition {
            variable,
            ty,
            default_value,
            directives,
            loc: self.loc(start),
        }
    }

    fn parse_fragment_definition(&mut self) -> FragmentDefinition {
        let start = self.current.span.start;
        self.advance(); // fragment

        let name = self.parse_name();
        self.expect_keyword("on");
        let type_condition = self.parse_name();
        let directives = self.parse_directives();
        let selection_set = self.parse_selection_set();

        FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set: Arc::new(selection_set),
            loc: self.loc(start),
        }
    }

    fn parse_selection_set(&mut self) -> SelectionSet {
        let start = self.current.span.start;
        self.expect(TokenKind::LBrace);

        let mut selections = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            selections.push(self.parse_selection());
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RBrace);

        SelectionSet {
            selections,
            loc: self.loc(start),
        }
    }

    fn parse_selection(&mut self) -> Selection {
        if !self.at_kind(TokenKind::Spread) {
            return Selection::Field(Arc::new(self.parse_field()));
        }

        let start = self.current.span.start;
        self.advance(); // ...

        if self.at_keyword("on") || !self.at_kind(TokenKind::Name) {
            let type_condition = if self.at_keyword("on") {
                self.advance();
                Some(self.parse_name())
            } else {
                None
            };
            let directives = self.parse_directives();
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(Arc::new(InlineFragment {
                type_condition,
                directives,
                selection_set: Arc::new(selection_set),
                loc: self.loc(start),
            }))
        } else {
            let name = self.parse_name();
            let directives = self.parse_directives();
            Selection::FragmentSpread(Arc::new(FragmentSpread {
                name,
                directives,
                loc: self.loc(start),
            }))
        }
    }

    fn parse_field(&mut self) -> Field {
        let start = self.current.span.start;

        let first_name = self.parse_name();
        let (alias, name) = if self.at_kind(TokenKind::Colon) {
            self.advance();
            (Some(first_name), self.parse_name())
        } else {
            (None, first_name)
        };

        let arguments = self.parse_arguments();
        let directives = self.parse_directives();

        let selection_set = if self.at_kind(TokenKind::LBrace) {
            Some(Arc::new(self.parse_selection_set()))
        } else {
            None
        };

        Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            loc: self.loc(start),
        }
    }

    fn parse_arguments(&mut self) -> Vec<Arc<Argument>> {
        if !self.at_kind(TokenKind::LParen) {
            return Vec::new();
        }
        self.advance();

        let mut args = Vec::new();
        while !self.at_kind(TokenKind::RParen) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            let start = self.current.span.start;
            let name = self.parse_name();
            self.expect(TokenKind::Colon);
            let value = self.parse_value();
            args.push(Arc::new(Argument {
                name,
                value,
                loc: self.loc(start),
            }));
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RParen);
        args
    }

    fn parse_directives(&mut self) -> Vec<Arc<Directive>> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            let start = self.current.span.start;
            self.advance(); // @
            let name = self.parse_name();
            let arguments = self.parse_arguments();
            directives.push(Arc::new(Directive {
                name,
                arguments,
                loc: self.loc(start),
            }));
        }
        directives
    }

    fn parse_value(&mut self) -> Value {
        let start = self.current.span.start;

        match self.at() {
            TokenKind::Dollar => Value::Variable(self.parse_variable()),
            TokenKind::IntLiteral => {
                let value = self.current_text().to_string();
                self.advance();
                Value::Int(IntValue {
                    value,
                    loc: self.loc(start),
                })
            }
            TokenKind::FloatLiteral => {
                let value = self.current_text().to_string();
                self.advance();
                Value::Float(FloatValue {
                    value,
                    loc: self.loc(start),
                })
            }
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral => {
                let value = if self.at_kind(TokenKind::StringLiteral) {
                    self.parse_string_literal()
                } else {
                    block_string_value(self.current_text())
                };
                self.advance();
                Value::String(StringValue {
                    value,
                    loc: self.loc(start),
                })
            }
            TokenKind::Name => {
                let text = self.current_text();
                self.advance();
                let loc = self.loc(start);
                match text {
                    "true" => Value::Boolean(BooleanValue { value: true, loc }),
                    "false" => Value::Boolean(BooleanValue { value: false, loc }),
                    "null" => Value::Null(NullValue { loc }),
                    _ => Value::Enum(EnumValue {
                        value: text.to_string(),
                        loc,
                    }),
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut values = Vec::new();
                while !self.at_kind(TokenKind::RBracket) && !self.at_kind(TokenKind::Eof) {
                    let before = self.current.span.start;
                    values.push(self.parse_value());
                    self.ensure_progress(before);
                }
                self.expect(TokenKind::RBracket);
                Value::List(Arc::new(ListValue {
                    values,
                    loc: self.loc(start),
                }))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                    let before = self.current.span.start;
                    let field_start = self.current.span.start;
                    let name = self.parse_name();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_value();
                    fields.push(Arc::new(ObjectField {
                        name,
                        value,
                        loc: self.loc(field_start),
                    }));
                    self.ensure_progress(before);
                }
                self.expect(TokenKind::RBrace);
                Value::Object(Arc::new(ObjectValue {
                    fields,
                    loc: self.loc(start),
                }))
            }
            _ => {
                self.error_expected("value");
                Value::null()
            }
        }
    }

    fn parse_type(&mut self) -> Type {
        let ty = if self.at_kind(TokenKind::LBracket) {
            self.advance();
            let inner = self.parse_type();
            self.expect(TokenKind::RBracket);
            Type::List(Box::new(inner))
        } else {
            Type::Named(self.parse_name())
        };

        if self.at_kind(TokenKind::Bang) {
            self.advance();
            Type::NonNull(Box::new(ty))
        } else {
            ty
        }
    }

    // =========================================================================
    // Type system definitions
    // =========================================================================

    fn parse_schema_definition(
        &mut self,
        start: u32,
        description: Option<String>,
        extension: bool,
    ) -> SchemaDefinition {
        self.advance(); // schema

        let directives = self.parse_directives();
        let mut root_operations = Vec::new();

        if !extension || self.at_kind(TokenKind::LBrace) {
            self.expect(TokenKind::LBrace);
            while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                let Some(operation) = OperationType::from_keyword(self.current_text())
                    .filter(|_| self.at_kind(TokenKind::Name))
                else {
                    self.error("expected operation type");
                    self.advance();
                    continue;
                };
                self.advance();
                self.expect(TokenKind::Colon);
                let named_type = self.parse_name();
                root_operations.push(RootOperationType {
                    operation,
                    named_type,
                });
            }
            self.expect(TokenKind::RBrace);
        }

        SchemaDefinition {
            description,
            extension,
            directives,
            root_operations,
            loc: self.loc(start),
        }
    }

    fn parse_type_definition(
        &mut self,
        start: u32,
        description: Option<String>,
        extension: bool,
    ) -> Option<TypeDefinition> {
        let keyword = self.current_text();
        if !matches!(
            keyword,
            "scalar" | "type" | "interface" | "union" | "enum" | "input"
        ) || !self.at_kind(TokenKind::Name)
        {
            self.error_expected("definition");
            return None;
        }
        self.advance();

        let name = self.parse_name();
        let (directives, kind) = match keyword {
            "scalar" => (self.parse_directives(), TypeDefinitionKind::Scalar),
            "type" | "interface" => {
                let interfaces = self.parse_implements();
                let directives = self.parse_directives();
                let fields = self.parse_field_definitions();
                let kind = if keyword == "type" {
                    TypeDefinitionKind::Object { interfaces, fields }
                } else {
                    TypeDefinitionKind::Interface { interfaces, fields }
                };
                (directives, kind)
            }
            "union" => {
                let directives = self.parse_directives();
                let mut members = Vec::new();
                if self.at_kind(TokenKind::Eq) {
                    self.advance();
                    if self.at_kind(TokenKind::Pipe) {
                        self.advance();
                    }
                    members.push(self.parse_name());
                    while self.at_kind(TokenKind::Pipe) {
                        self.advance();
                        members.push(self.parse_name());
                    }
                }
                (directives, TypeDefinitionKind::Union { members })
            }
            "enum" => {
                let directives = self.parse_directives();
                let values = self.parse_enum_values();
                (directives, TypeDefinitionKind::Enum { values })
            }
            _ => {
                let directives = self.parse_directives();
                let fields = if self.at_kind(TokenKind::LBrace) {
                    self.advance();
                    let fields = self.parse_input_value_definitions(TokenKind::RBrace);
                    self.expect(TokenKind::RBrace);
                    fields
                } else {
                    Vec::new()
                };
                (directives, TypeDefinitionKind::InputObject { fields })
            }
        };

        Some(TypeDefinition {
            description,
            extension,
            name,
            directives,
            kind,
            loc: self.loc(start),
        })
    }

    fn parse_implements(&mut self) -> Vec<Name> {
        let mut interfaces = Vec::new();
        if self.at_keyword("implements") {
            self.advance();
            if self.at_kind(TokenKind::Amp) {
                self.advance();
            }
            interfaces.push(self.parse_name());
            while self.at_kind(TokenKind::Amp) {
                self.advance();
                interfaces.push(self.parse_name());
            }
        }
        interfaces
    }

    fn parse_field_definitions(&mut self) -> Vec<FieldDefinition> {
        let mut fields = Vec::new();
        if !self.at_kind(TokenKind::LBrace) {
            return fields;
        }
        self.advance();

        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            let start = self.current.span.start;
            let description = self.parse_description();
            let name = self.parse_name();

            let arguments = if self.at_kind(TokenKind::LParen) {
                self.advance();
                let args = self.parse_input_value_definitions(TokenKind::RParen);
                self.expect(TokenKind::RParen);
                args
            } else {
                Vec::new()
            };

            self.expect(TokenKind::Colon);
            let ty = self.parse_type();
            let directives = self.parse_directives();

            fields.push(FieldDefinition {
                description,
                name,
                arguments,
                ty,
                directives,
                loc: self.loc(start),
            });
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RBrace);
        fields
    }

    fn parse_input_value_definitions(&mut self, close: TokenKind) -> Vec<InputValueDefinition> {
        let mut values = Vec::new();
        while !self.at_kind(close) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            let start = self.current.span.start;
            let description = self.parse_description();
            let name = self.parse_name();
            self.expect(TokenKind::Colon);
            let ty = self.parse_type();

            let default_value = if self.at_kind(TokenKind::Eq) {
                self.advance();
                Some(self.parse_value())
            } else {
                None
            };

            let directives = self.parse_directives();

            values.push(InputValueDefinition {
                description,
                name,
                ty,
                default_value,
                directives,
                loc: self.loc(start),
            });
            self.ensure_progress(before);
        }
        values
    }

    fn parse_enum_values(&mut self) -> Vec<EnumValueDefinition> {
        let mut values = Vec::new();
        if !self.at_kind(TokenKind::LBrace) {
            return values;
        }
        self.advance();

        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            let start = self.current.span.start;
            let description = self.parse_description();
            if self.at_keyword("true") || self.at_keyword("false") || self.at_keyword("null") {
                self.error("enum values cannot be named true, false or null");
            }
            let name = self.parse_name();
            let directives = self.parse_directives();
            values.push(EnumValueDefinition {
                description,
                name,
                directives,
                loc: self.loc(start),
            });
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RBrace);
        values
    }

    fn parse_directive_definition(
        &mut self,
        start: u32,
        description: Option<String>,
    ) -> DirectiveDefinition {
        self.advance(); // directive
        self.expect(TokenKind::At);
        let name = self.parse_name();

        let arguments = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let args = self.parse_input_value_definitions(TokenKind::RParen);
            self.expect(TokenKind::RParen);
            args
        } else {
            Vec::new()
        };

        let repeatable = self.at_keyword("repeatable");
        if repeatable {
            self.advance();
        }

        self.expect_keyword("on");
        if self.at_kind(TokenKind::Pipe) {
            self.advance();
        }
        let mut locations = vec![self.parse_name()];
        while self.at_kind(TokenKind::Pipe) {
            self.advance();
            locations.push(self.parse_name());
        }

        DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            loc: self.loc(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_operation(source: &str) -> Arc<OperationDefinition> {
        let result = parse(source);
        assert!(!result.diagnostics.has_errors(), "{source}");
        match result.document.definitions.into_iter().next() {
            Some(Definition::Operation(op)) => op,
            other => panic!("expected operation, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_anonymous_query() {
        let op = first_operation("{ user { id name } }");
        assert_eq!(op.operation, OperationType::Query);
        assert!(op.name.is_none());

        let user = op.selection_set.field("user").unwrap();
        let nested = user.selection_set.as_ref().unwrap();
        assert_eq!(nested.selections.len(), 2);
    }

    #[test]
    fn test_parse_named_mutation_with_arguments() {
        let op = first_operation(
            r#"mutation signUp($n: Int = 3) { signUp(company: { name: "", tags: [A, B] }, limit: $n) }"#,
        );
        assert_eq!(op.operation, OperationType::Mutation);
        assert_eq!(op.name.as_ref().unwrap().as_str(), "signUp");
        assert_eq!(op.variable_definitions.len(), 1);
        assert_eq!(op.variable_definitions[0].ty.to_string(), "Int");

        let field = op.selection_set.field("signUp").unwrap();
        let company = field.argument("company").unwrap();
        let object = company.value.as_object().unwrap();
        assert_eq!(object.fields.len(), 2);
        assert_eq!(object.field("name").unwrap().value, Value::string(""));
        assert_eq!(
            field.argument("limit").unwrap().value.kind(),
            ValueKind::Variable
        );
    }

    #[test]
    fn test_parse_values() {
        let op = first_operation(
            r#"{ f(a: 1, b: -2.5e3, c: "x\ty", d: true, e: null, g: RED, h: """ block """) }"#,
        );
        let field = op.selection_set.field("f").unwrap();
        let kinds: Vec<_> = field.arguments.iter().map(|a| a.value.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::Int,
                ValueKind::Float,
                ValueKind::String,
                ValueKind::Boolean,
                ValueKind::Null,
                ValueKind::Enum,
                ValueKind::String,
            ]
        );
        assert_eq!(field.argument("c").unwrap().value, Value::string("x\ty"));
        assert_eq!(field.argument("h").unwrap().value, Value::string(" block "));
    }

    #[test]
    fn test_parse_fragments() {
        let op = first_operation("{ node { __typename ... on User { id } ...Rest } }");
        let node = op.selection_set.field("node").unwrap();
        let set = node.selection_set.as_ref().unwrap();
        assert!(set.inline_fragment("User").is_some());
        assert!(matches!(set.selections[2], Selection::FragmentSpread(_)));
    }

    #[test]
    fn test_field_named_like_keywords() {
        let op = first_operation("{ type query fragment on }");
        assert_eq!(op.selection_set.selections.len(), 4);
    }

    #[test]
    fn test_alias() {
        let op = first_operation("{ me: user { id } }");
        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(field.alias.as_ref().unwrap().as_str(), "me");
        assert_eq!(field.name.as_str(), "user");
    }

    #[test]
    fn test_node_locations_cover_own_tokens() {
        let source = "query Q { user(id: 1)   { id } }";
        let op = first_operation(source);
        let user = op.selection_set.field("user").unwrap();
        assert_eq!(user.source_text(), Some("user(id: 1)   { id }"));
        assert_eq!(
            user.argument("id").unwrap().source_text(),
            Some("id: 1")
        );
        assert_eq!(op.source_text(), Some(source));
    }

    #[test]
    fn test_parse_type_system() {
        let source = r#"
            schema { query: Root }
            "The root"
            type Root implements Node & Entity @key(fields: "id") {
              "Identifier"
              id: ID!
              users(first: Int = 10, filter: [Filter!]): [User]
            }
            interface Node { id: ID! }
            union Result = | User | Org
            enum Color { RED GREEN }
            input Filter { name: String! = "x" }
            scalar Long
            directive @key(fields: String!) repeatable on OBJECT | INTERFACE
            extend type Root { extra: String }
        "#;
        let result = parse(source);
        assert!(!result.diagnostics.has_errors());
        assert_eq!(result.document.definitions.len(), 9);

        let Definition::Type(root) = &result.document.definitions[1] else {
            panic!("expected type definition");
        };
        assert_eq!(root.description.as_deref(), Some("The root"));
        let TypeDefinitionKind::Object { interfaces, fields } = &root.kind else {
            panic!("expected object type");
        };
        assert_eq!(interfaces.len(), 2);
        assert_eq!(fields[1].arguments.len(), 2);
        assert_eq!(fields[1].ty.to_string(), "[User]");

        let Definition::Type(extension) = &result.document.definitions[8] else {
            panic!("expected extension");
        };
        assert!(extension.extension);
    }

    #[test]
    fn test_missing_brace_reports_error() {
        let result = parse("{ user { id }");
        assert!(result.diagnostics.has_errors());
        let error = parse_document("{ user { id }").unwrap_err();
        assert_eq!(error.code, codes::UNEXPECTED_EOF);
    }

    #[test]
    fn test_string_cut_after_backslash() {
        let error = parse_document("{ a(x: \"\\").unwrap_err();
        assert_eq!(error.code, codes::UNTERMINATED_STRING);
        assert_eq!(error.offset(), 7);
    }

    #[test]
    fn test_invalid_operation_name() {
        let error = parse_document("query 123 { id }").unwrap_err();
        assert_eq!(error.offset(), 6);
    }

    #[test]
    fn test_garbage_does_not_loop() {
        let result = parse("{ ) ] ? } } ");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn test_empty_document() {
        let result = parse("  # nothing here\n");
        assert!(!result.diagnostics.has_errors());
        assert!(result.document.definitions.is_empty());
    }
}
