use std::collections::BTreeMap;

use capability::ParameterType;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

mod evaluator;

pub use evaluator::{DocumentEvaluator, Evaluator};

#[remain::sorted]
#[derive(Debug, Error)]
pub enum TemplatingError {
    /// Reference resolution failed, including cycles.
    #[error(transparent)]
    Document(#[from] document::DocumentError),

    #[error("parameter {parameter} of {capability} must be {expected}, found {found}")]
    InvalidParameter {
        capability: String,
        parameter: String,
        expected: ParameterType,
        found: String,
    },

    #[error("template {0} does not define an output")]
    MissingOutput(String),

    #[error("Creating a Context from a Value requires it being a JSON object")]
    TemplateContextError(),

    /// Error that may occur while interpolating string values.
    #[error("Template error: `{0}`")]
    TemplateError(#[from] minijinja::Error),

    #[error("parameter {parameter} is not declared by {capability}")]
    UnknownParameter {
        capability: String,
        parameter: String,
    },
}

pub type TemplatingResult<T> = Result<T, TemplatingError>;

/// Values exposed to templates under `context`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateContext {
    pub data: BTreeMap<String, Value>,
}

impl TemplateContext {
    /// Initializes an empty context
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Context for rendering the capabilities of one component.
    pub fn for_component(name: &str, app_name: &str, namespace: &str) -> Self {
        Self::from_iter([
            ("name", name),
            ("appName", app_name),
            ("namespace", namespace),
        ])
    }

    /// Takes a serde-json `Value` and convert it into a `Context` with no overhead/cloning.
    pub fn from_value(obj: Value) -> TemplatingResult<Self> {
        match obj {
            Value::Object(m) => Ok(TemplateContext {
                data: m.into_iter().collect(),
            }),
            _ => Err(TemplatingError::TemplateContextError()),
        }
    }

    /// Returns the value at a given key index.
    pub fn get(&self, index: &str) -> Option<&Value> {
        self.data.get(index)
    }

    /// Checks if a value exists at a specific index.
    pub fn contains_key(&self, index: &str) -> bool {
        self.data.contains_key(index)
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for TemplateContext {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// String interpolation for `{{ ... }}` expressions inside template values.
#[derive(Debug)]
pub struct Templates<'a> {
    env: Environment<'a>,
}

impl Templates<'_> {
    /// Constructs a new instance. Undefined variables are errors rather than empty strings.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }

    pub fn is_template(source: &str) -> bool {
        source.contains("{{") || source.contains("{%")
    }

    /// Renders a one-off template string against `context`.
    pub fn render_str<S: Serialize>(&self, source: &str, context: S) -> TemplatingResult<String> {
        Ok(self.env.render_str(source, context)?)
    }
}

impl Default for Templates<'_> {
    fn default() -> Self {
        Self::new()
    }
}
