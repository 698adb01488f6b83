use thiserror::Error;

use crate::node::{Decl, Field, Node};
use crate::join_path;

/// Returned by [`lookup`] when the path does not lead to a present value.
///
/// This is distinct from a value that is present but empty (an empty struct or list).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("path `{}` not found", join_path(.path))]
pub struct NotFound {
    pub path: Vec<String>,
}

/// Walks `root` following `path` and returns the node found at its end.
///
/// Fields are matched on identifier labels only; computed labels are skipped. Lists are indexed
/// by the base-10 form of a position. The walk is purely structural: references are not followed.
pub fn lookup<'a, S: AsRef<str>>(root: &'a Node, path: &[S]) -> Result<&'a Node, NotFound> {
    walk(root, path).ok_or_else(|| NotFound {
        path: path.iter().map(|s| s.as_ref().to_string()).collect(),
    })
}

fn walk<'a, S: AsRef<str>>(node: &'a Node, path: &[S]) -> Option<&'a Node> {
    let Some((key, rest)) = path.split_first() else {
        return Some(node);
    };
    let key = key.as_ref();

    let next = match node {
        Node::File(file) => find_field(&file.decls, key)?.value.as_ref()?,
        Node::Struct(s) => find_field(&s.elts, key)?.value.as_ref()?,
        Node::List(list) => list
            .elts
            .iter()
            .enumerate()
            .find(|(index, _)| index.to_string() == key)
            .map(|(_, elt)| elt)?,
        Node::Scalar(_) | Node::Reference(_) => return None,
    };

    walk(next, rest)
}

/// First field among `decls` whose identifier label equals `key`.
pub(crate) fn find_field<'a>(decls: &'a [Decl], key: &str) -> Option<&'a Field> {
    decls.iter().find_map(|decl| match decl {
        Decl::Field(field) if field.label.ident() == Some(key) => Some(field),
        _ => None,
    })
}
