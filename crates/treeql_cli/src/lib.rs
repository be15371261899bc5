//! treeql CLI
//!
//! Command-line access to the query synchronization engine.
//!
//! # Usage
//!
//! ```bash
//! # Synthesize the default query for a root field
//! treeql default schema.graphql user
//!
//! # Format query files
//! treeql fmt queries/*.graphql
//!
//! # Show the schema tree of a query
//! treeql tree schema.graphql query.graphql
//!
//! # Edit a query through tree paths
//! treeql edit schema.graphql query.graphql --toggle user.name --set 'user(id)=42'
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use treeql_engine::{
    synthesize_operation, Context, DocumentEditor, Editor, EditorConfig, Hooks, NodeKind,
    TreeEdit, TreeNode, TreePath, TreeView,
};
use treeql_schema::Schema;
use treeql_syntax::{format, FormatOptions, OperationType};

/// treeql - keep GraphQL query text and its schema tree in sync
#[derive(Parser, Debug)]
#[command(name = "treeql")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Editor configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize the default query for a root field
    Default {
        /// Schema file (SDL)
        schema: PathBuf,

        /// Root field to build the query for
        field: String,

        /// Operation type of the root field
        #[arg(long, default_value = "query", value_parser = parse_operation_type)]
        operation: OperationType,
    },

    /// Format GraphQL query files
    #[command(alias = "format")]
    Fmt {
        /// Files to format
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Check if files are formatted (don't write)
        #[arg(long)]
        check: bool,

        /// Indentation width
        #[arg(long, default_value = "2")]
        indent: usize,

        /// Use tabs for indentation
        #[arg(long)]
        tabs: bool,
    },

    /// Show the schema tree of a query
    Tree {
        /// Schema file (SDL)
        schema: PathBuf,

        /// Query file
        query: PathBuf,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a query through tree paths
    ///
    /// Edits run in groups: toggles, then values, then added rows, then
    /// removed rows.
    Edit {
        /// Schema file (SDL)
        schema: PathBuf,

        /// Query file
        query: PathBuf,

        /// Toggle the node at PATH
        #[arg(long, value_name = "PATH")]
        toggle: Vec<TreePath>,

        /// Set the value at PATH from TEXT
        #[arg(long, value_name = "PATH=TEXT", value_parser = parse_set)]
        set: Vec<(TreePath, String)>,

        /// Append a row to the list at PATH
        #[arg(long, value_name = "PATH")]
        add_row: Vec<TreePath>,

        /// Remove row N of the list at PATH
        #[arg(long, value_name = "PATH#N", value_parser = parse_remove_row)]
        remove_row: Vec<(TreePath, usize)>,

        /// Write the result back to the query file
        #[arg(long)]
        write: bool,
    },
}

fn parse_operation_type(s: &str) -> Result<OperationType, String> {
    OperationType::from_keyword(s)
        .ok_or_else(|| format!("expected query, mutation or subscription, found `{s}`"))
}

fn parse_set(s: &str) -> Result<(TreePath, String), String> {
    let (path, text) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=TEXT, found `{s}`"))?;
    let path = path.parse().map_err(|err: treeql_engine::PathError| err.to_string())?;
    Ok((path, text.to_string()))
}

fn parse_remove_row(s: &str) -> Result<(TreePath, usize), String> {
    let (path, index) = s
        .rsplit_once('#')
        .ok_or_else(|| format!("expected PATH#N, found `{s}`"))?;
    let path = path.parse().map_err(|err: treeql_engine::PathError| err.to_string())?;
    let index = index
        .parse()
        .map_err(|_| format!("expected a row number, found `{index}`"))?;
    Ok((path, index))
}

/// Run the CLI with the given arguments.
pub fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Default {
            schema,
            field,
            operation,
        } => default_query(&schema, &field, operation, &config),
        Commands::Fmt {
            files,
            check,
            indent,
            tabs,
        } => {
            let options = FormatOptions {
                indent_size: indent,
                use_tabs: tabs,
                ..config.format
            };
            Ok(format_files(&files, check, &options, cli.quiet))
        }
        Commands::Tree {
            schema,
            query,
            json,
        } => show_tree(&schema, &query, json, config),
        Commands::Edit {
            schema,
            query,
            toggle,
            set,
            add_row,
            remove_row,
            write,
        } => {
            let edits: Vec<TreeEdit> = toggle
                .into_iter()
                .map(TreeEdit::Toggle)
                .chain(set.into_iter().map(|(path, text)| TreeEdit::Input { path, text }))
                .chain(add_row.into_iter().map(TreeEdit::AddRow))
                .chain(
                    remove_row
                        .into_iter()
                        .map(|(path, index)| TreeEdit::RemoveRow { path, index }),
                )
                .collect();
            edit_query(&schema, &query, &edits, write, config, cli.quiet)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let source = fs::read_to_string(path)?;
    let config = serde_json::from_str(&source)?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Reads and builds a schema, printing a report when it is invalid.
fn load_schema(path: &Path) -> Result<Option<Schema>, Box<dyn std::error::Error>> {
    let sdl = fs::read_to_string(path)?;
    match Schema::parse(&sdl) {
        Ok(schema) => Ok(Some(schema)),
        Err(err) => {
            report_error(path, err);
            Ok(None)
        }
    }
}

fn report_error(path: &Path, err: impl miette::Diagnostic + Send + Sync + 'static) {
    eprintln!("{} {}", "Error".red().bold(), path.display());
    eprintln!("{:?}", miette::Report::new(err));
}

fn default_query(
    schema: &Path,
    field: &str,
    operation: OperationType,
    config: &EditorConfig,
) -> Result<i32, Box<dyn std::error::Error>> {
    let Some(schema) = load_schema(schema)? else {
        return Ok(1);
    };
    let hooks = Hooks::new();
    let cx = Context::from_config(&schema, &hooks, config);
    let text = synthesize_operation(cx, field, operation, &config.format);
    if text.is_empty() {
        eprintln!(
            "{} `{}` is not a {} root field",
            "Error".red().bold(),
            field,
            operation
        );
        return Ok(1);
    }
    print!("{text}");
    Ok(0)
}

fn format_files(files: &[PathBuf], check: bool, options: &FormatOptions, quiet: bool) -> i32 {
    let mut has_changes = false;
    let mut has_errors = false;

    for path in files {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("{} {}: {}", "Error".red().bold(), path.display(), err);
                has_errors = true;
                continue;
            }
        };

        let formatted = match format(&source, options) {
            Ok(formatted) => formatted,
            Err(err) => {
                report_error(path, err);
                has_errors = true;
                continue;
            }
        };

        if formatted == source {
            if !quiet {
                println!("{} {}", "Unchanged".dimmed(), path.display());
            }
            continue;
        }

        has_changes = true;
        if check {
            println!("{} {}", "Would format".yellow(), path.display());
        } else if let Err(err) = fs::write(path, &formatted) {
            eprintln!("{} {}: {}", "Error".red().bold(), path.display(), err);
            has_errors = true;
        } else if !quiet {
            println!("{} {}", "Formatted".green(), path.display());
        }
    }

    if has_errors || (check && has_changes) {
        1
    } else {
        0
    }
}

/// Opens an editor over a query file.
fn open_editor(
    schema: &Path,
    query: &Path,
    config: EditorConfig,
) -> Result<Option<DocumentEditor>, Box<dyn std::error::Error>> {
    let Some(schema) = load_schema(schema)? else {
        return Ok(None);
    };
    let source = fs::read_to_string(query)?;
    if let Err(err) = treeql_syntax::parse_document(&source) {
        report_error(query, err);
        return Ok(None);
    }

    let mut editor = DocumentEditor::new(config, Hooks::new()).with_query(source);
    editor.set_schema(schema);
    Ok(Some(editor))
}

fn show_tree(
    schema: &Path,
    query: &Path,
    json: bool,
    config: EditorConfig,
) -> Result<i32, Box<dyn std::error::Error>> {
    let Some(mut editor) = open_editor(schema, query, config)? else {
        return Ok(1);
    };
    let Some(tree) = editor.tree() else {
        return Ok(1);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print!("{}", outline(&tree));
    }
    Ok(0)
}

fn edit_query(
    schema: &Path,
    query: &Path,
    edits: &[TreeEdit],
    write: bool,
    config: EditorConfig,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let Some(mut editor) = open_editor(schema, query, config)? else {
        return Ok(1);
    };

    for edit in edits {
        if let Err(err) = editor.apply(edit) {
            eprintln!("{} {}", "Error".red().bold(), err);
            return Ok(1);
        }
    }

    if write {
        fs::write(query, editor.text())?;
        if !quiet {
            println!("{} {}", "Edited".green(), query.display());
        }
    } else {
        print!("{}", editor.text());
    }
    Ok(0)
}

/// Renders a tree view as an indented outline with check boxes.
fn outline(tree: &TreeView) -> String {
    let mut out = String::new();
    for operation in &tree.operations {
        let name = operation.name.as_deref().unwrap_or("<anonymous>");
        out.push_str(&format!(
            "{} {} {}\n",
            operation.operation_type.to_string().blue(),
            name.bold(),
            operation.root_type.as_deref().unwrap_or("?").dimmed()
        ));
        for node in &operation.children {
            outline_node(node, 1, &mut out);
        }
    }
    out
}

fn outline_node(node: &TreeNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    if node.kind == NodeKind::Unhandled {
        out.push_str(&format!("{indent}{} {}\n", "?".yellow(), node.name.dimmed()));
        return;
    }

    let check = match (node.selected, node.toggleable) {
        (true, false) => "[*]".to_string(),
        (true, true) => "[x]".green().to_string(),
        (false, _) => "[ ]".to_string(),
    };
    let name = match node.kind {
        NodeKind::Argument => format!("({})", node.name),
        NodeKind::Fragment => format!("... on {}", node.name),
        _ => node.name.clone(),
    };
    let value = match &node.editor {
        Some(Editor::Scalar { value, .. }) => format!(" = {value}"),
        Some(Editor::Enum { value, .. }) => format!(" = {}", value.as_deref().unwrap_or("null")),
        Some(Editor::Custom(custom)) => format!(" <{}>", custom.widget),
        None => String::new(),
    };
    out.push_str(&format!(
        "{indent}{check} {name}: {}{value}\n",
        node.type_name.dimmed()
    ));
    for child in &node.children {
        outline_node(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_edit_arguments() {
        let cli = Cli::try_parse_from([
            "treeql",
            "edit",
            "schema.graphql",
            "query.graphql",
            "--toggle",
            "user.name",
            "--set",
            "user(id)=a=b",
            "--remove-row",
            "search(filter)#2",
        ])
        .unwrap();

        let Commands::Edit {
            toggle,
            set,
            remove_row,
            ..
        } = cli.command
        else {
            panic!("expected edit");
        };
        assert_eq!(toggle, ["user.name".parse::<TreePath>().unwrap()]);
        assert_eq!(set[0].0, "user(id)".parse::<TreePath>().unwrap());
        assert_eq!(set[0].1, "a=b");
        assert_eq!(remove_row[0], ("search(filter)".parse().unwrap(), 2));
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(parse_set("user(id)").is_err());
        assert!(parse_remove_row("search(filter)").is_err());
        assert!(parse_remove_row("search(filter)#x").is_err());
        assert!(parse_operation_type("fragment").is_err());
        assert_eq!(parse_operation_type("mutation"), Ok(OperationType::Mutation));
    }

    #[test]
    fn test_outline() {
        colored::control::set_override(false);
        let schema = Schema::parse(
            "type Query { user(id: ID!): User } type User { id: ID! name: String }",
        )
        .unwrap();
        let mut editor = DocumentEditor::new(EditorConfig::default(), Hooks::new())
            .with_query("query Q { user(id: \"1\") { id } }");
        editor.set_schema(schema);

        assert_eq!(
            outline(&editor.tree().unwrap()),
            "query Q Query\n  [x] user: User\n    [*] (id): ID! = 1\n    [x] id: ID!\n    [ ] name: String\n"
        );
    }
}
