use tracing::trace;

use crate::lookup::{find_field, lookup};
use crate::node::{Decl, Field, File, ListLit, Node, Reference, StructLit};
use crate::{join_path, DocumentError, DocumentResult};

/// Resolves every reference in `root`, returning a reference-free copy.
///
/// References are absolute dotted paths from `root`. A reference to an absent field makes the
/// referring field absent as well. Following a reference back into a value that is still being
/// evaluated is reported as [`DocumentError::Cycle`].
pub fn evaluate(root: &Node) -> DocumentResult<Node> {
    let mut evaluator = Evaluator {
        root,
        in_progress: Vec::new(),
    };

    evaluator
        .node(root, &mut Vec::new())?
        .ok_or_else(|| DocumentError::UnresolvedReference(String::new()))
}

struct Evaluator<'a> {
    root: &'a Node,
    in_progress: Vec<Vec<String>>,
}

impl<'a> Evaluator<'a> {
    fn node(&mut self, node: &'a Node, path: &mut Vec<String>) -> DocumentResult<Option<Node>> {
        let evaluated = match node {
            Node::File(file) => Node::File(File {
                filename: file.filename.clone(),
                decls: self.decls(&file.decls, path)?,
            }),
            Node::Struct(s) => Node::Struct(StructLit {
                elts: self.decls(&s.elts, path)?,
            }),
            Node::List(list) => {
                let mut elts = Vec::with_capacity(list.elts.len());
                for (index, elt) in list.elts.iter().enumerate() {
                    path.push(index.to_string());
                    let value = self.node(elt, path)?;
                    let value = value.ok_or_else(|| unresolved(path))?;
                    path.pop();
                    elts.push(value);
                }
                Node::List(ListLit { elts })
            }
            Node::Scalar(scalar) => Node::Scalar(scalar.clone()),
            Node::Reference(reference) => return self.follow(reference),
        };

        Ok(Some(evaluated))
    }

    fn decls(&mut self, decls: &'a [Decl], path: &mut Vec<String>) -> DocumentResult<Vec<Decl>> {
        let mut evaluated = Vec::with_capacity(decls.len());
        for decl in decls {
            match decl {
                Decl::Field(field) => {
                    path.push(field.label.as_str().to_string());
                    self.in_progress.push(path.clone());
                    let value = match &field.value {
                        Some(value) => self.node(value, path),
                        None => Ok(None),
                    };
                    self.in_progress.pop();
                    path.pop();

                    evaluated.push(Decl::Field(Field {
                        label: field.label.clone(),
                        value: value?,
                        doc: field.doc.clone(),
                    }));
                }
                Decl::Embed(node) => {
                    let value = self.node(node, path)?.ok_or_else(|| unresolved(path))?;
                    evaluated.push(Decl::Embed(value));
                }
            }
        }

        Ok(evaluated)
    }

    fn follow(&mut self, reference: &Reference) -> DocumentResult<Option<Node>> {
        if self
            .in_progress
            .iter()
            .any(|path| path.starts_with(&reference.path))
        {
            return Err(DocumentError::Cycle(reference.to_string()));
        }

        let Some(target) = self.resolve(&reference.path)? else {
            trace!(reference = %reference, "reference target is absent");
            return Ok(None);
        };

        self.in_progress.push(reference.path.clone());
        let mut path = reference.path.clone();
        let value = self.node(target, &mut path);
        self.in_progress.pop();
        value
    }

    /// Finds the raw node a reference points to, `None` when the walk reaches a field that is
    /// declared but absent, including an intermediate one.
    fn resolve(&self, path: &[String]) -> DocumentResult<Option<&'a Node>> {
        let mut node = self.root;
        for segment in path {
            let decls = match node {
                Node::File(file) => &file.decls,
                Node::Struct(s) => &s.elts,
                other => {
                    node = lookup(other, &[segment]).map_err(|_| unresolved(path))?;
                    continue;
                }
            };

            match find_field(decls, segment).map(|field| field.value.as_ref()) {
                Some(Some(value)) => node = value,
                Some(None) => return Ok(None),
                None => return Err(unresolved(path)),
            }
        }

        Ok(Some(node))
    }
}

fn unresolved(path: &[String]) -> DocumentError {
    DocumentError::UnresolvedReference(join_path(path))
}
