//! End-to-end editing scenarios.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use treeql_engine::{
    apply_edit, merge::merge_object_field_into_object_value, synthesize_operation, Context,
    DocumentEditor, EditorConfig, Hooks, NodeKind, TreeEdit, TreePath,
};
use treeql_schema::{ScalarKinds, Schema};
use treeql_syntax::{parse_document, FormatOptions, ObjectField, OperationType, Value};

const SDL: &str = r#"
    type Query {
      user(id: ID!, after: String, limit: Int): User
      node(id: ID!): Node
      ping: Boolean
    }
    type Mutation {
      signUp(company: CompanyInput!): Boolean
    }
    interface Node { id: ID! }
    type User implements Node { id: ID! name: String email: String }
    type Org implements Node { id: ID! title: String }
    input CompanyInput { name: String! size: Int }
"#;

fn schema() -> Schema {
    Schema::parse(SDL).unwrap()
}

fn path(text: &str) -> TreePath {
    text.parse().unwrap()
}

fn recorded(editor: &mut DocumentEditor) -> Arc<Mutex<Vec<String>>> {
    let published = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&published);
    editor.subscribe(move |text| sink.lock().unwrap().push(text.to_string()));
    published
}

/// Test default query synthesis for a mutation with a required input object.
#[test]
fn test_default_mutation_query() {
    let schema = schema();
    let hooks = Hooks::new();
    let scalars = ScalarKinds::default();
    let cx = Context::new(&schema, &hooks, &scalars);

    insta::assert_snapshot!(
        synthesize_operation(cx, "signUp", OperationType::Mutation, &FormatOptions::default()).trim_end(),
        @r###"
    mutation signUp {
      signUp(company: { name: "" })
    }
    "###
    );
}

/// Test toggling an optional argument on and back off.
#[test]
fn test_toggle_optional_argument() {
    let schema = schema();
    let hooks = Hooks::new();
    let scalars = ScalarKinds::default();
    let cx = Context::new(&schema, &hooks, &scalars);
    let document = parse_document("query Q { user(id: \"1\", after: \"x\") { id } }").unwrap();
    let operation = document.operation(0).unwrap();
    let user = |operation: &Arc<treeql_syntax::OperationDefinition>| {
        Arc::clone(operation.selection_set.field("user").unwrap())
    };
    let original = user(operation);

    let on = apply_edit(cx, operation, &TreeEdit::Toggle(path("user(limit)"))).unwrap();
    let with_limit = user(&on);
    let names: Vec<_> = with_limit.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["id", "after", "limit"]);
    assert_eq!(with_limit.argument("limit").unwrap().value, Value::int(0));

    let off = apply_edit(cx, &on, &TreeEdit::Toggle(path("user(limit)"))).unwrap();
    let without_limit = user(&off);
    assert_eq!(without_limit.arguments.len(), 2);
    for (kept, before) in without_limit.arguments.iter().zip(&original.arguments) {
        assert!(Arc::ptr_eq(kept, before));
    }
}

/// Test that replacing an input field builds a new, sorted object value.
#[test]
fn test_replace_object_field() {
    let object = match Value::object(vec![
        ObjectField::new("a", Value::int(1)),
        ObjectField::new("b", Value::int(2)),
    ]) {
        Value::Object(object) => object,
        _ => unreachable!(),
    };
    let a = Arc::clone(&object.fields[0]);
    let new_a = Arc::new(ObjectField::new("a", Value::int(3)));

    let merged = merge_object_field_into_object_value(&object, Some(&a), Some(&new_a));
    assert!(!Arc::ptr_eq(&merged, &object));
    assert!(Arc::ptr_eq(&merged.fields[0], &new_a));
    assert!(Arc::ptr_eq(&merged.fields[1], &object.fields[1]));
}

/// Test that a field added in the text shows up checked in the tree.
#[test]
fn test_text_edit_reaches_tree() {
    let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
        .with_query("query Q { user(id: \"1\") { id } }");
    editor.set_schema(schema());

    let before = editor.tree().unwrap();
    assert!(!before.find(&path("user.email")).unwrap().selected);

    assert!(editor.on_text_edit("query Q { user(id: \"1\") { id email } }"));
    let after = editor.tree().unwrap();
    assert!(after.find(&path("user.email")).unwrap().selected);
}

/// Test interface implementations rendering as unchecked fragments.
#[test]
fn test_interface_fragments() {
    let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
        .with_query("query Q { node(id: \"1\") { id } }");
    editor.set_schema(schema());

    let tree = editor.tree().unwrap();
    let node = tree.find(&path("node")).unwrap();
    let fragments: Vec<_> = node
        .children
        .iter()
        .filter(|child| child.kind == NodeKind::Fragment)
        .map(|child| (child.name.as_str(), child.selected))
        .collect();
    assert_eq!(fragments, [("Org", false), ("User", false)]);
}

/// Test that malformed text leaves the editor as it was.
#[test]
fn test_malformed_text_is_ignored() {
    let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
        .with_query("query Q { user(id: \"1\") { id } }");
    let published = recorded(&mut editor);
    editor.set_schema(schema());
    let before = editor.tree().unwrap();

    assert!(!editor.on_text_edit("query Q { user(id: \"1\") { id "));
    assert!(published.lock().unwrap().is_empty());
    assert_eq!(editor.tree().unwrap(), before);

    assert!(editor.apply(&TreeEdit::Toggle(path("user.name"))).unwrap());
    assert_eq!(published.lock().unwrap().len(), 1);
    assert!(editor.tree().unwrap().find(&path("user.name")).unwrap().selected);
}

/// Test that every prefix of a query, as typed, is either taken or ignored.
#[test]
fn test_typing_prefixes_is_safe() {
    let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
        .with_query("query Q { user(id: \"1\") { id } }");
    editor.set_schema(schema());

    assert!(!editor.on_text_edit("{ user(id: \"\\"));
    assert!(editor.tree().unwrap().find(&path("user.id")).unwrap().selected);

    let target = "query Q { user(id: \"a\\\"b\\u00e9\", after: \"\"\"x\"\"\") { id name } }";
    for (end, _) in target.char_indices().skip(1) {
        editor.on_text_edit(&target[..end]);
        assert!(editor.tree().is_some());
    }
    assert!(editor.on_text_edit(target));
    assert!(editor.tree().unwrap().find(&path("user.name")).unwrap().selected);
}

/// Test a session of edits from an empty default to a filled-in query.
#[test]
fn test_editing_session() {
    let config = EditorConfig::new().with_default_field("user", OperationType::Query);
    let mut editor = DocumentEditor::new(config, Hooks::new());
    let published = recorded(&mut editor);
    editor.set_schema(schema());

    let edits = [
        TreeEdit::Input {
            path: path("user(id)"),
            text: "42".to_string(),
        },
        TreeEdit::Toggle(path("user.name")),
        TreeEdit::Toggle(path("user.id")),
        TreeEdit::Toggle(path("user.__typename")),
        TreeEdit::RenameOperation {
            operation: 0,
            name: "Profile".to_string(),
        },
    ];
    let mut results = Vec::new();
    for edit in &edits {
        results.push(editor.apply(edit).map_err(|err| err.to_string()));
    }

    // `__typename` is not a schema field
    assert_eq!(
        results,
        [
            Ok(true),
            Ok(true),
            Ok(true),
            Err("`user.__typename`: `User` has no field `__typename`".to_string()),
            Ok(true),
        ]
    );
    insta::assert_snapshot!(editor.text().trim_end(), @r###"
    query Profile {
      user(id: "42") {
        id
        __typename
        name
      }
    }
    "###);
    assert_eq!(published.lock().unwrap().len(), 5);
}

/// Test the serialized tree view.
#[test]
fn test_tree_json() {
    let mut editor = DocumentEditor::new(EditorConfig::new(), Hooks::new())
        .with_query("query Q { user(id: \"1\") { id } }");
    editor.set_schema(schema());
    let tree = editor.tree().unwrap();
    let id = tree.find(&path("user(id)")).unwrap();

    let json = serde_json::to_value(id).unwrap();
    assert_eq!(json["kind"], "argument");
    assert_eq!(json["typeName"], "ID!");
    assert_eq!(json["toggleable"], false);
    assert_eq!(
        json["editor"],
        serde_json::json!({ "type": "scalar", "kind": "string", "value": "1" })
    );
    assert_eq!(
        json["path"],
        serde_json::json!({
            "operation": 0,
            "segments": [
                { "kind": "field", "key": "user" },
                { "kind": "argument", "key": "id" }
            ]
        })
    );
}
