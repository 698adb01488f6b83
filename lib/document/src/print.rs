use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::eval::evaluate;
use crate::node::{Decl, Field, File, Label, Node, Scalar};
use crate::DocumentResult;

lazy_static! {
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

const INDENT: &str = "\t";
const SEPARATOR: &str = "// ---\n";

/// Evaluates `node` and formats the result as a canonical document.
pub fn print(node: &Node) -> DocumentResult<String> {
    print_all(std::slice::from_ref(node))
}

/// Evaluates and formats several units into one text.
///
/// A unit read from a file is preceded by a comment holding the file's base name. Units without
/// a name are separated from whatever precedes them by `// ---`.
pub fn print_all(nodes: &[Node]) -> DocumentResult<String> {
    let mut out = String::new();
    let mut use_sep = false;
    for node in nodes {
        let file = to_file(evaluate(node)?);
        if let Some(name) = &file.filename {
            let base = Path::new(name)
                .file_name()
                .map_or_else(|| name.clone(), |n| n.to_string_lossy().to_string());
            out.push_str(&format!("// {base}\n"));
        } else if use_sep {
            out.push_str(SEPARATOR);
        }
        use_sep = true;

        write_decls(&mut out, &file.decls, 0);
    }

    Ok(out)
}

fn to_file(node: Node) -> File {
    match node {
        Node::File(file) => file,
        Node::Struct(s) => File::new(s.elts),
        expr => File::new(vec![Decl::Embed(expr)]),
    }
}

fn write_decls(out: &mut String, decls: &[Decl], depth: usize) {
    let indent = INDENT.repeat(depth);
    for decl in decls {
        match decl {
            Decl::Field(field) => write_field(out, field, depth),
            Decl::Embed(node) => {
                out.push_str(&indent);
                write_node(out, node, depth);
                out.push('\n');
            }
        }
    }
}

fn write_field(out: &mut String, field: &Field, depth: usize) {
    let indent = INDENT.repeat(depth);
    if let Some(doc) = &field.doc {
        for line in doc.lines() {
            out.push_str(&format!("{indent}// {line}\n"));
        }
    }

    out.push_str(&indent);
    out.push_str(&format_label(&field.label));
    out.push_str(": ");
    match &field.value {
        Some(value) => write_node(out, value, depth),
        None => out.push('_'),
    }
    out.push('\n');
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    match node {
        Node::File(file) => write_block(out, &file.decls, depth),
        Node::Struct(s) => write_block(out, &s.elts, depth),
        Node::List(list) if list.elts.is_empty() => out.push_str("[]"),
        Node::List(list) if list.elts.iter().all(|e| matches!(e, Node::Scalar(_))) => {
            let items: Vec<String> = list
                .elts
                .iter()
                .filter_map(|e| match e {
                    Node::Scalar(s) => Some(format_scalar(s)),
                    _ => None,
                })
                .collect();
            out.push_str(&format!("[{}]", items.join(", ")));
        }
        Node::List(list) => {
            let inner = INDENT.repeat(depth + 1);
            out.push_str("[\n");
            for elt in &list.elts {
                out.push_str(&inner);
                write_node(out, elt, depth + 1);
                out.push_str(",\n");
            }
            out.push_str(&INDENT.repeat(depth));
            out.push(']');
        }
        Node::Scalar(scalar) => out.push_str(&format_scalar(scalar)),
        Node::Reference(reference) => out.push_str(&reference.to_string()),
    }
}

fn write_block(out: &mut String, decls: &[Decl], depth: usize) {
    if decls.is_empty() {
        out.push_str("{}");
        return;
    }

    out.push_str("{\n");
    write_decls(out, decls, depth + 1);
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
}

fn format_label(label: &Label) -> String {
    match label {
        Label::Ident(name) if IDENTIFIER_REGEX.is_match(name) => name.clone(),
        Label::Ident(name) => quote(name),
        Label::Computed(expr) => format!("({expr})"),
    }
}

fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => format!("{f:?}"),
        Scalar::String(s) => quote(s),
    }
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node::{Label, ListLit};
    use crate::DocumentError;

    #[test]
    fn prints_nested_documents() {
        let node = Node::File(File {
            filename: Some("/tmp/templates/webservice.yaml".to_string()),
            decls: vec![
                Decl::Field(Field::new("name", Node::string("web")).with_doc("component name")),
                Decl::Field(Field::new(
                    "spec",
                    Node::structure(vec![
                        Field::new("replicas", Node::int(2)),
                        Field::new("ports", Node::from(json!([80, 443]))),
                        Field::new("app.kubernetes.io/name", Node::string("web")),
                        Field::absent("cmd"),
                    ]),
                )),
            ],
        });

        let printed = print(&node).unwrap();

        assert_eq!(
            printed,
            "// webservice.yaml\n\
             // component name\n\
             name: \"web\"\n\
             spec: {\n\
             \treplicas: 2\n\
             \tports: [80, 443]\n\
             \t\"app.kubernetes.io/name\": \"web\"\n\
             \tcmd: _\n\
             }\n"
        );
    }

    #[test]
    fn bare_expression_is_wrapped_without_leading_whitespace() {
        assert_eq!(print(&Node::string("hello")).unwrap(), "\"hello\"\n");
    }

    #[test]
    fn lists_of_structs_span_lines() {
        let node = Node::structure(vec![Field::new(
            "containers",
            Node::List(ListLit {
                elts: vec![Node::structure(vec![Field::new("name", Node::string("a"))])],
            }),
        )]);

        assert_eq!(
            print(&node).unwrap(),
            "containers: [\n\t{\n\t\tname: \"a\"\n\t},\n]\n"
        );
    }

    #[test]
    fn computed_labels_are_parenthesized() {
        let node = Node::structure(vec![Field {
            label: Label::Computed("parameter.key".to_string()),
            value: Some(Node::Scalar(Scalar::Bool(true))),
            doc: None,
        }]);

        assert_eq!(print(&node).unwrap(), "(parameter.key): true\n");
    }

    #[test]
    fn unnamed_units_are_separated() {
        let printed = print_all(&[
            Node::structure(vec![Field::new("a", Node::int(1))]),
            Node::structure(vec![Field::new("b", Node::int(2))]),
        ])
        .unwrap();

        assert_eq!(printed, "a: 1\n// ---\nb: 2\n");
    }

    #[test]
    fn references_are_resolved_before_printing() {
        let node = Node::structure(vec![
            Field::new("a", Node::int(1)),
            Field::new("b", Node::reference("a")),
        ]);

        assert_eq!(print(&node).unwrap(), "a: 1\nb: 1\n");
    }

    #[test]
    fn printing_a_cycle_fails() {
        let node = Node::structure(vec![
            Field::new("a", Node::reference("b")),
            Field::new("b", Node::reference("a")),
        ]);

        assert!(matches!(print(&node), Err(DocumentError::Cycle(_))));
    }
}
