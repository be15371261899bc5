//! Printing and formatting of GraphQL documents.
//!
//! One layout engine backs both entry points. [`print`] produces canonical compact
//! text (`{a: 1}` objects, never wraps). [`format`] re-parses its input and lays it
//! out for people: padded objects, argument lists wrapped one per line once a line
//! would exceed [`FormatOptions::max_width`], and a final newline.

use std::sync::Arc;

use crate::ast::*;
use crate::error::SyntaxError;
use crate::parser::parse_document;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Formatting options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct FormatOptions {
    /// Number of spaces for indentation.
    pub indent_size: usize,
    /// Use tabs instead of spaces.
    pub use_tabs: bool,
    /// Maximum line width.
    pub max_width: usize,
    /// Pad object values: `{ a: 1 }` instead of `{a: 1}`.
    pub bracket_spacing: bool,
    /// End non-empty output with a newline.
    pub final_newline: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            use_tabs: false,
            max_width: 80,
            bracket_spacing: true,
            final_newline: true,
        }
    }
}

impl FormatOptions {
    /// The layout used by [`print`].
    #[must_use]
    pub fn compact() -> Self {
        Self {
            indent_size: 2,
            use_tabs: false,
            max_width: usize::MAX,
            bracket_spacing: false,
            final_newline: false,
        }
    }
}

/// An item of a parenthesized group, with an optional description that forces
/// the group onto multiple lines.
struct GroupItem {
    description: Option<String>,
    text: String,
}

/// Document formatter.
pub struct Formatter {
    options: FormatOptions,
    output: String,
    indent: usize,
}

impl Formatter {
    /// Creates a new formatter.
    #[must_use]
    pub fn new(options: FormatOptions) -> Self {
        Self {
            options,
            output: String::new(),
            indent: 0,
        }
    }

    /// Formats a document.
    pub fn format(&mut self, document: &Document) -> String {
        self.output.clear();
        self.indent = 0;

        for (i, def) in document.definitions.iter().enumerate() {
            if i > 0 {
                self.output.push_str("\n\n");
            }
            self.format_definition(def);
        }

        if self.options.final_newline && !self.output.is_empty() {
            self.output.push('\n');
        }

        std::mem::take(&mut self.output)
    }

    fn format_definition(&mut self, def: &Definition) {
        match def {
            Definition::Operation(op) => self.format_operation(op),
            Definition::Fragment(fragment) => self.format_fragment_definition(fragment),
            Definition::Schema(schema) => self.format_schema(schema),
            Definition::Type(ty) => self.format_type_definition(ty),
            Definition::Directive(directive) => self.format_directive_definition(directive),
        }
    }

    // =========================================================================
    // Executable definitions
    // =========================================================================

    fn format_operation(&mut self, op: &OperationDefinition) {
        let shorthand = op.operation == OperationType::Query
            && op.name.as_ref().map_or(true, |name| name.value.is_empty())
            && op.variable_definitions.is_empty()
            && op.directives.is_empty();

        if !shorthand {
            self.output.push_str(op.operation.as_str());
            if let Some(name) = op.name.as_ref().filter(|name| !name.value.is_empty()) {
                self.output.push(' ');
                self.output.push_str(&name.value);
            }

            let items: Vec<GroupItem> = op
                .variable_definitions
                .iter()
                .map(|var| GroupItem {
                    description: None,
                    text: self.variable_definition_text(var),
                })
                .collect();
            let directives = self.directives_text(&op.directives);
            self.write_group(&items, '(', ')', directives.len() + 2);
            self.output.push_str(&directives);
            self.output.push(' ');
        }

        self.format_selection_set(&op.selection_set);
    }

    fn format_fragment_definition(&mut self, fragment: &FragmentDefinition) {
        self.output.push_str("fragment ");
        self.output.push_str(&fragment.name.value);
        self.output.push_str(" on ");
        self.output.push_str(&fragment.type_condition.value);
        let directives = self.directives_text(&fragment.directives);
        self.output.push_str(&directives);
        self.output.push(' ');
        self.format_selection_set(&fragment.selection_set);
    }

    fn format_selection_set(&mut self, set: &SelectionSet) {
        if set.selections.is_empty() {
            self.output.push_str("{}");
            return;
        }

        self.output.push_str("{\n");
        self.indent += 1;
        for selection in &set.selections {
            self.push_indent();
            self.format_selection(selection);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.push_indent();
        self.output.push('}');
    }

    fn format_selection(&mut self, selection: &Selection) {
        match selection {
            Selection::Field(field) => self.format_field(field),
            Selection::FragmentSpread(spread) => {
                self.output.push_str("...");
                self.output.push_str(&spread.name.value);
                let directives = self.directives_text(&spread.directives);
                self.output.push_str(&directives);
            }
            Selection::InlineFragment(fragment) => {
                self.output.push_str("...");
                if let Some(type_condition) = &fragment.type_condition {
                    self.output.push_str(" on ");
                    self.output.push_str(&type_condition.value);
                }
                let directives = self.directives_text(&fragment.directives);
                self.output.push_str(&directives);
                self.output.push(' ');
                self.format_selection_set(&fragment.selection_set);
            }
        }
    }

    fn format_field(&mut self, field: &Field) {
        if let Some(alias) = &field.alias {
            self.output.push_str(&alias.value);
            self.output.push_str(": ");
        }
        self.output.push_str(&field.name.value);

        let items: Vec<GroupItem> = field
            .arguments
            .iter()
            .map(|arg| GroupItem {
                description: None,
                text: self.argument_text(arg),
            })
            .collect();
        let directives = self.directives_text(&field.directives);
        let suffix = directives.len() + if field.selection_set.is_some() { 2 } else { 0 };
        self.write_group(&items, '(', ')', suffix);
        self.output.push_str(&directives);

        if let Some(set) = &field.selection_set {
            self.output.push(' ');
            self.format_selection_set(set);
        }
    }

    // =========================================================================
    // Type system definitions
    // =========================================================================

    fn format_schema(&mut self, schema: &SchemaDefinition) {
        if let Some(description) = &schema.description {
            self.format_description(description);
        }
        if schema.extension {
            self.output.push_str("extend ");
        }
        self.output.push_str("schema");
        let directives = self.directives_text(&schema.directives);
        self.output.push_str(&directives);

        if schema.root_operations.is_empty() && schema.extension {
            return;
        }

        self.output.push_str(" {\n");
        self.indent += 1;
        for root in &schema.root_operations {
            self.push_indent();
            self.output.push_str(root.operation.as_str());
            self.output.push_str(": ");
            self.output.push_str(&root.named_type.value);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.push_indent();
        self.output.push('}');
    }

    fn format_type_definition(&mut self, def: &TypeDefinition) {
        if let Some(description) = &def.description {
            self.format_description(description);
        }
        if def.extension {
            self.output.push_str("extend ");
        }
        self.output.push_str(def.kind.keyword());
        self.output.push(' ');
        self.output.push_str(&def.name.value);

        match &def.kind {
            TypeDefinitionKind::Scalar => {
                let directives = self.directives_text(&def.directives);
                self.output.push_str(&directives);
            }
            TypeDefinitionKind::Object { interfaces, fields }
            | TypeDefinitionKind::Interface { interfaces, fields } => {
                if !interfaces.is_empty() {
                    self.output.push_str(" implements ");
                    let names: Vec<&str> = interfaces.iter().map(Name::as_str).collect();
                    self.output.push_str(&names.join(" & "));
                }
                let directives = self.directives_text(&def.directives);
                self.output.push_str(&directives);
                self.format_block(fields, Self::format_field_definition);
            }
            TypeDefinitionKind::Union { members } => {
                let directives = self.directives_text(&def.directives);
                self.output.push_str(&directives);
                if !members.is_empty() {
                    self.output.push_str(" = ");
                    let names: Vec<&str> = members.iter().map(Name::as_str).collect();
                    self.output.push_str(&names.join(" | "));
                }
            }
            TypeDefinitionKind::Enum { values } => {
                let directives = self.directives_text(&def.directives);
                self.output.push_str(&directives);
                self.format_block(values, |this, value| {
                    if let Some(description) = &value.description {
                        this.format_description(description);
                    }
                    this.output.push_str(&value.name.value);
                    let directives = this.directives_text(&value.directives);
                    this.output.push_str(&directives);
                });
            }
            TypeDefinitionKind::InputObject { fields } => {
                let directives = self.directives_text(&def.directives);
                self.output.push_str(&directives);
                self.format_block(fields, |this, field| {
                    if let Some(description) = &field.description {
                        this.format_description(description);
                    }
                    let text = this.input_value_text(field);
                    this.output.push_str(&text);
                });
            }
        }
    }

    /// Writes ` { item* }` with one item per line, or nothing for no items.
    fn format_block<T>(&mut self, items: &[T], mut write: impl FnMut(&mut Self, &T)) {
        if items.is_empty() {
            return;
        }
        self.output.push_str(" {\n");
        self.indent += 1;
        for item in items {
            self.push_indent();
            write(self, item);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.push_indent();
        self.output.push('}');
    }

    fn format_field_definition(&mut self, field: &FieldDefinition) {
        if let Some(description) = &field.description {
            self.format_description(description);
        }
        self.output.push_str(&field.name.value);

        let items: Vec<GroupItem> = field
            .arguments
            .iter()
            .map(|arg| GroupItem {
                description: arg.description.clone(),
                text: self.input_value_text(arg),
            })
            .collect();
        let ty = field.ty.to_string();
        let directives = self.directives_text(&field.directives);
        self.write_group(&items, '(', ')', ty.len() + directives.len() + 2);
        self.output.push_str(": ");
        self.output.push_str(&ty);
        self.output.push_str(&directives);
    }

    fn format_directive_definition(&mut self, def: &DirectiveDefinition) {
        if let Some(description) = &def.description {
            self.format_description(description);
        }
        self.output.push_str("directive @");
        self.output.push_str(&def.name.value);

        let items: Vec<GroupItem> = def
            .arguments
            .iter()
            .map(|arg| GroupItem {
                description: arg.description.clone(),
                text: self.input_value_text(arg),
            })
            .collect();
        self.write_group(&items, '(', ')', 0);

        if def.repeatable {
            self.output.push_str(" repeatable");
        }
        self.output.push_str(" on ");
        let locations: Vec<&str> = def.locations.iter().map(Name::as_str).collect();
        self.output.push_str(&locations.join(" | "));
    }

    /// Writes a description line (or block) followed by a newline and indentation.
    fn format_description(&mut self, description: &str) {
        if description.contains('\n') {
            self.output.push_str("\"\"\"\n");
            for line in description.lines() {
                if !line.is_empty() {
                    self.push_indent();
                    self.output.push_str(&line.replace("\"\"\"", "\\\"\"\""));
                }
                self.output.push('\n');
            }
            self.push_indent();
            self.output.push_str("\"\"\"\n");
        } else {
            write_string(&mut self.output, description);
            self.output.push('\n');
        }
        self.push_indent();
    }

    // =========================================================================
    // Inline pieces
    // =========================================================================

    /// Writes `(a, b)` on the current line if it fits before `suffix_width` more
    /// columns, otherwise one item per line. Writes nothing for no items.
    fn write_group(&mut self, items: &[GroupItem], open: char, close: char, suffix_width: usize) {
        if items.is_empty() {
            return;
        }

        let inline_width = items.iter().map(|item| item.text.chars().count()).sum::<usize>()
            + 2 * (items.len() - 1)
            + 2;
        let fits = self.current_column() + inline_width + suffix_width <= self.options.max_width;
        let has_description = items.iter().any(|item| item.description.is_some());

        self.output.push(open);
        if fits && !has_description {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    self.output.push_str(", ");
                }
                self.output.push_str(&item.text);
            }
        } else {
            self.output.push('\n');
            self.indent += 1;
            for item in items {
                self.push_indent();
                if let Some(description) = &item.description {
                    self.format_description(description);
                }
                self.output.push_str(&item.text);
                self.output.push('\n');
            }
            self.indent -= 1;
            self.push_indent();
        }
        self.output.push(close);
    }

    fn current_column(&self) -> usize {
        self.output
            .rsplit('\n')
            .next()
            .map_or(0, |line| line.chars().count())
    }

    fn argument_text(&self, arg: &Argument) -> String {
        let mut out = String::new();
        out.push_str(&arg.name.value);
        out.push_str(": ");
        self.write_value(&mut out, &arg.value);
        out
    }

    fn variable_definition_text(&self, var: &VariableDefinition) -> String {
        let mut out = format!("${}: {}", var.variable.name.value, var.ty);
        if let Some(default) = &var.default_value {
            out.push_str(" = ");
            self.write_value(&mut out, default);
        }
        out.push_str(&self.directives_text(&var.directives));
        out
    }

    fn input_value_text(&self, def: &InputValueDefinition) -> String {
        let mut out = format!("{}: {}", def.name.value, def.ty);
        if let Some(default) = &def.default_value {
            out.push_str(" = ");
            self.write_value(&mut out, default);
        }
        out.push_str(&self.directives_text(&def.directives));
        out
    }

    /// Directives with a leading space each, e.g. ` @include(if: $x)`.
    fn directives_text(&self, directives: &[Arc<Directive>]) -> String {
        let mut out = String::new();
        for directive in directives {
            out.push_str(" @");
            out.push_str(&directive.name.value);
            if !directive.arguments.is_empty() {
                out.push('(');
                for (i, arg) in directive.arguments.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.argument_text(arg));
                }
                out.push(')');
            }
        }
        out
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::Variable(var) => {
                out.push('$');
                out.push_str(&var.name.value);
            }
            Value::Int(v) => out.push_str(&v.value),
            Value::Float(v) => out.push_str(&v.value),
            Value::String(v) => write_string(out, &v.value),
            Value::Boolean(v) => out.push_str(if v.value { "true" } else { "false" }),
            Value::Null(_) => out.push_str("null"),
            Value::Enum(v) => out.push_str(&v.value),
            Value::List(list) => {
                out.push('[');
                for (i, item) in list.values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_value(out, item);
                }
                out.push(']');
            }
            Value::Object(object) => {
                if object.fields.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push('{');
                if self.options.bracket_spacing {
                    out.push(' ');
                }
                for (i, field) in object.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&field.name.value);
                    out.push_str(": ");
                    self.write_value(out, &field.value);
                }
                if self.options.bracket_spacing {
                    out.push(' ');
                }
                out.push('}');
            }
        }
    }

    fn push_indent(&mut self) {
        if self.options.use_tabs {
            for _ in 0..self.indent {
                self.output.push('\t');
            }
        } else {
            for _ in 0..(self.indent * self.options.indent_size) {
                self.output.push(' ');
            }
        }
    }
}

/// Writes a quoted, escaped string literal.
fn write_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04X}", u32::from(c)));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Prints a document in canonical compact form.
#[must_use]
pub fn print(document: &Document) -> String {
    Formatter::new(FormatOptions::compact()).format(document)
}

/// Lays out an in-memory document with the given options, without re-parsing.
#[must_use]
pub fn format_document(document: &Document, options: &FormatOptions) -> String {
    Formatter::new(options.clone()).format(document)
}

/// Parses `source` and lays it out for people.
pub fn format(source: &str, options: &FormatOptions) -> Result<String, SyntaxError> {
    let document = parse_document(source)?;
    Ok(format_document(&document, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fmt(source: &str) -> String {
        format(source, &FormatOptions::default()).unwrap()
    }

    #[test]
    fn test_print_compact() {
        let doc = parse_document(r#"mutation signUp { signUp(company: {name: "", size: 3}) { id } }"#)
            .unwrap();
        assert_eq!(
            print(&doc),
            "mutation signUp {\n  signUp(company: {name: \"\", size: 3}) {\n    id\n  }\n}"
        );
    }

    #[test]
    fn test_print_anonymous_query_shorthand() {
        let doc = parse_document("query { a }").unwrap();
        assert_eq!(print(&doc), "{\n  a\n}");
    }

    #[test]
    fn test_print_empty_name_is_omitted() {
        let op = OperationDefinition::new(
            OperationType::Mutation,
            Some(Name::new("")),
            SelectionSet::new(vec![Field::new("a").into()]),
        );
        let doc = Document::new(vec![Definition::Operation(Arc::new(op))]);
        assert_eq!(print(&doc), "mutation {\n  a\n}");
    }

    #[test]
    fn test_format_pads_objects() {
        assert_eq!(
            fmt(r#"mutation signUp { signUp(company: {name: ""}) }"#),
            "mutation signUp {\n  signUp(company: { name: \"\" })\n}\n"
        );
    }

    #[test]
    fn test_format_wraps_long_arguments() {
        insta::assert_snapshot!(
            fmt("{ searchUsers(query: \"a fairly long search string\", first: 100, orderBy: NAME_ASC) { id } }")
                .trim_end(),
            @r###"
        {
          searchUsers(
            query: "a fairly long search string"
            first: 100
            orderBy: NAME_ASC
          ) {
            id
          }
        }
        "###
        );
    }

    #[test]
    fn test_format_is_idempotent() {
        let sources = [
            "{ searchUsers(query: \"a fairly long search string\", first: 100, orderBy: NAME_ASC) { id } }",
            "query Q($id: ID!, $n: Int = 3) @live { user(id: $id) { ... on Admin { level } ...Rest } }",
            "fragment Rest on User { name }",
            "type Query { \"multi\\nline\" user(id: ID!): User }",
            r#"{ a(s: "quote \" and \\ and \n") }"#,
        ];
        for source in sources {
            let once = fmt(source);
            let twice = fmt(&once);
            assert_eq!(once, twice, "{source}");
        }
    }

    #[test]
    fn test_format_rejects_invalid_text() {
        assert!(format("query 123 { a }", &FormatOptions::default()).is_err());
    }

    #[test]
    fn test_format_type_system() {
        insta::assert_snapshot!(
            fmt(r#"schema { query: Root } "Root type" type Root implements Node @key(fields: "id") { id: ID! users(first: Int = 10): [User] } union R = A | B enum Color { RED GREEN } input F { a: String! = "x" } scalar Long directive @key(fields: String!) repeatable on OBJECT | INTERFACE"#)
                .trim_end(),
            @r###"
        schema {
          query: Root
        }

        "Root type"
        type Root implements Node @key(fields: "id") {
          id: ID!
          users(first: Int = 10): [User]
        }

        union R = A | B

        enum Color {
          RED
          GREEN
        }

        input F {
          a: String! = "x"
        }

        scalar Long

        directive @key(fields: String!) repeatable on OBJECT | INTERFACE
        "###
        );
    }

    #[test]
    fn test_format_tabs() {
        let options = FormatOptions {
            use_tabs: true,
            ..FormatOptions::default()
        };
        assert_eq!(format("{ a { b } }", &options).unwrap(), "{\n\ta {\n\t\tb\n\t}\n}\n");
    }
}
