use std::fmt::{Display, Formatter};

use serde_json::{Map, Number, Value};
use serde_yaml::value::TaggedValue;

use crate::{join_path, DocumentError, DocumentResult};

const REFERENCE_TAG: &str = "ref";
const COMPUTED_LABEL_TAG: &str = "expr";

/// A node of a document syntax tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A whole document, optionally tied to the file it was read from.
    File(File),
    /// A brace-delimited set of declarations.
    Struct(StructLit),
    List(ListLit),
    Scalar(Scalar),
    /// A dotted path to another field of the same document, resolved by [`crate::evaluate`].
    Reference(Reference),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct File {
    pub filename: Option<String>,
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructLit {
    pub elts: Vec<Decl>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListLit {
    pub elts: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Field(Field),
    /// A bare expression embedded among the declarations.
    Embed(Node),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub label: Label,
    /// `None` marks a declared but absent value.
    pub value: Option<Node>,
    pub doc: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Label {
    Ident(String),
    /// A label computed from an expression. Never matched by path lookups.
    Computed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub path: Vec<String>,
}

impl Field {
    pub fn new<S: Into<String>>(name: S, value: Node) -> Self {
        Self {
            label: Label::Ident(name.into()),
            value: Some(value),
            doc: None,
        }
    }

    pub fn absent<S: Into<String>>(name: S) -> Self {
        Self {
            label: Label::Ident(name.into()),
            value: None,
            doc: None,
        }
    }

    #[must_use]
    pub fn with_doc<S: Into<String>>(mut self, doc: S) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

impl Label {
    /// Returns the identifier name, or `None` for computed labels.
    pub fn ident(&self) -> Option<&str> {
        match self {
            Label::Ident(name) => Some(name),
            Label::Computed(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Ident(s) | Label::Computed(s) => s,
        }
    }
}

impl Reference {
    pub fn parse(path: &str) -> Self {
        Self {
            path: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", join_path(&self.path))
    }
}

impl File {
    pub fn new(decls: Vec<Decl>) -> Self {
        Self {
            filename: None,
            decls,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        fields_of(&self.decls)
    }
}

impl StructLit {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            elts: fields.into_iter().map(Decl::Field).collect(),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        fields_of(&self.elts)
    }
}

fn fields_of(decls: &[Decl]) -> impl Iterator<Item = &Field> {
    decls.iter().filter_map(|d| match d {
        Decl::Field(f) => Some(f),
        Decl::Embed(_) => None,
    })
}

impl Node {
    pub fn string<S: Into<String>>(value: S) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Node::Scalar(Scalar::Int(value))
    }

    pub fn reference(path: &str) -> Self {
        Node::Reference(Reference::parse(path))
    }

    pub fn structure(fields: Vec<Field>) -> Self {
        Node::Struct(StructLit::new(fields))
    }

    /// Wraps a struct literal (or any other node) into a named file.
    pub fn into_file(self, filename: Option<String>) -> File {
        match self {
            Node::File(mut file) => {
                if filename.is_some() {
                    file.filename = filename;
                }
                file
            }
            Node::Struct(s) => File {
                filename,
                decls: s.elts,
            },
            other => File {
                filename,
                decls: vec![Decl::Embed(other)],
            },
        }
    }

    /// Converts a reference-free node into plain data.
    ///
    /// Absent fields are dropped; references must have been resolved with [`crate::evaluate`].
    pub fn to_json(&self) -> DocumentResult<Value> {
        match self {
            Node::File(file) => decls_to_json(&file.decls),
            Node::Struct(s) => decls_to_json(&s.elts),
            Node::List(list) => Ok(Value::Array(
                list.elts
                    .iter()
                    .map(Node::to_json)
                    .collect::<DocumentResult<Vec<Value>>>()?,
            )),
            Node::Scalar(scalar) => Ok(scalar.to_json()),
            Node::Reference(r) => Err(DocumentError::UnevaluatedReference(r.to_string())),
        }
    }
}

fn decls_to_json(decls: &[Decl]) -> DocumentResult<Value> {
    let mut map = Map::new();
    let mut embedded = None;
    for decl in decls {
        match decl {
            Decl::Field(field) => {
                if let Some(value) = &field.value {
                    map.insert(field.label.as_str().to_string(), value.to_json()?);
                }
            }
            Decl::Embed(node) => match node.to_json()? {
                Value::Object(fields) => map.extend(fields),
                other => embedded = Some(other),
            },
        }
    }

    match embedded {
        Some(value) if map.is_empty() => Ok(value),
        Some(_) => Err(DocumentError::InvalidLabel(
            "a non-struct embedding cannot be mixed with fields".to_string(),
        )),
        None => Ok(Value::Object(map)),
    }
}

impl Scalar {
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::Number((*i).into()),
            Scalar::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => Node::Scalar(number_scalar(n.as_i64(), n.as_f64())),
            Value::String(s) => Node::string(s.as_str()),
            Value::Array(items) => Node::List(ListLit {
                elts: items.iter().map(Node::from).collect(),
            }),
            Value::Object(map) => Node::structure(
                map.iter()
                    .map(|(k, v)| Field::new(k.as_str(), Node::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from(&value)
    }
}

fn number_scalar(int: Option<i64>, float: Option<f64>) -> Scalar {
    match (int, float) {
        (Some(i), _) => Scalar::Int(i),
        (None, Some(f)) => Scalar::Float(f),
        (None, None) => Scalar::Null,
    }
}

impl TryFrom<serde_yaml::Value> for Node {
    type Error = DocumentError;

    fn try_from(value: serde_yaml::Value) -> DocumentResult<Self> {
        use serde_yaml::Value as Yaml;

        Ok(match value {
            Yaml::Null => Node::Scalar(Scalar::Null),
            Yaml::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Yaml::Number(n) => Node::Scalar(number_scalar(n.as_i64(), n.as_f64())),
            Yaml::String(s) => Node::string(s),
            Yaml::Sequence(items) => Node::List(ListLit {
                elts: items
                    .into_iter()
                    .map(Node::try_from)
                    .collect::<DocumentResult<Vec<Node>>>()?,
            }),
            Yaml::Mapping(mapping) => {
                let mut fields = Vec::with_capacity(mapping.len());
                for (key, value) in mapping {
                    fields.push(Field {
                        label: yaml_label(key)?,
                        value: Some(Node::try_from(value)?),
                        doc: None,
                    });
                }
                Node::structure(fields)
            }
            Yaml::Tagged(tagged) => tagged_node(*tagged)?,
        })
    }
}

fn tagged_node(tagged: TaggedValue) -> DocumentResult<Node> {
    if tagged.tag == REFERENCE_TAG {
        if let serde_yaml::Value::String(path) = tagged.value {
            return Ok(Node::reference(&path));
        }
    }

    Err(DocumentError::UnsupportedTag(tagged.tag.to_string()))
}

fn yaml_label(key: serde_yaml::Value) -> DocumentResult<Label> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(Label::Ident(s)),
        Yaml::Bool(b) => Ok(Label::Ident(b.to_string())),
        Yaml::Number(n) => Ok(Label::Ident(n.to_string())),
        Yaml::Tagged(tagged) if tagged.tag == COMPUTED_LABEL_TAG => match tagged.value {
            Yaml::String(expr) => Ok(Label::Computed(expr)),
            other => Err(DocumentError::InvalidLabel(format!("{other:?}"))),
        },
        other => Err(DocumentError::InvalidLabel(format!("{other:?}"))),
    }
}
