use document::{File, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::CapabilityResult;

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CapabilityKind {
    Workload,
    Trait,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParameterType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Object,
    List,
}

impl ParameterType {
    /// Whether `value` is acceptable for a parameter of this type. Integers must fit in an `i64`.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParameterType::String => value.is_string(),
            ParameterType::Int => value.is_i64(),
            ParameterType::Float => value.is_number(),
            ParameterType::Bool => value.is_boolean(),
            ParameterType::Object => value.is_object(),
            ParameterType::List => value.is_array(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: ParameterType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default)]
    pub usage: String,
}

impl ParameterSpec {
    pub fn new<S: Into<String>>(name: S, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            usage: String::new(),
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A workload or trait blueprint.
///
/// `template` is the document handed to the template evaluator. By convention its `output`
/// field holds the produced resource and it refers to bound values through `parameter.<name>`
/// and `context.<key>` references.
#[derive(Clone, Debug, PartialEq)]
pub struct CapabilityTemplate {
    pub name: String,
    pub kind: CapabilityKind,
    pub description: Option<String>,
    pub parameters: Vec<ParameterSpec>,
    pub template: File,
}

#[derive(Deserialize)]
struct CapabilityDefinition {
    name: String,
    kind: CapabilityKind,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Vec<ParameterSpec>,
    template: serde_yaml::Value,
}

impl CapabilityTemplate {
    /// Parses a YAML (or JSON) capability definition.
    pub fn from_yaml_str(content: &str, filename: Option<String>) -> CapabilityResult<Self> {
        let definition: CapabilityDefinition = serde_yaml::from_str(content)?;
        let template = Node::try_from(definition.template)?.into_file(filename);

        Ok(Self {
            name: definition.name,
            kind: definition.kind,
            description: definition.description,
            parameters: definition.parameters,
            template,
        })
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }
}
