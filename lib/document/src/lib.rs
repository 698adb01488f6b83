//! Tree-structured documents used by capability templates and appfiles.
//!
//! A [`Node`] is a small syntax tree (files, struct literals, lists, scalars and references).
//! [`lookup`] walks it structurally, [`evaluate`] resolves references and [`print`] turns it
//! back into canonical text.

mod eval;
mod lookup;
mod node;
mod print;

use thiserror::Error;

pub use eval::evaluate;
pub use lookup::{lookup, NotFound};
pub use node::{Decl, Field, File, Label, ListLit, Node, Reference, Scalar, StructLit};
pub use print::{print, print_all};

#[remain::sorted]
#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    /// A reference was reached again while it was still being evaluated.
    #[error("cyclic reference detected at `{0}`")]
    Cycle(String),

    #[error("invalid label in document: {0}")]
    InvalidLabel(String),

    #[error("reference `{0}` cannot be converted to a plain value before evaluation")]
    UnevaluatedReference(String),

    #[error("reference `{0}` does not resolve to a value")]
    UnresolvedReference(String),

    #[error("unsupported tag `{0}`")]
    UnsupportedTag(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Joins path segments into the dotted form used in references and error messages.
pub fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(".")
}
