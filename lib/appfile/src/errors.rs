use capability::CapabilityError;
use templating::TemplatingError;
use thiserror::Error;

use crate::apply::ClientError;

/// Structural problems found before any rendering is attempted.
#[remain::sorted]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name is required")]
    NameRequired,

    #[error("at least one service is required")]
    NoServices,

    #[error("trait {trait_name} in '{service}' must be map")]
    TraitNotMap { trait_name: String, service: String },
}

/// Problems binding a service's fields to capability parameters.
#[remain::sorted]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("reserved field {0} must be a string")]
    InvalidReservedField(String),

    #[error("missing required parameter {parameter} for {capability}")]
    MissingRequired {
        capability: String,
        parameter: String,
    },

    #[error("trait {0} must be map")]
    TraitNotMap(String),

    #[error("field {field} is neither a parameter of workload {workload} nor a known trait")]
    UnknownField { field: String, workload: String },

    #[error("{parameter} is not a parameter of {capability}")]
    UnknownParameter {
        capability: String,
        parameter: String,
    },
}

#[remain::sorted]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config entry on line {line}: {content}")]
    InvalidLine { line: usize, content: String },

    /// Error that may occur while I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config {name} not found in environment {environment}")]
    NotFound { name: String, environment: String },

    #[error("no config store is available")]
    Unavailable,

    /// Error that may occur when attempting to interpret a sequence of u8 as a
    /// string.
    #[error("UTF-8 error: `{0}`")]
    Utf8Error(#[from] std::str::Utf8Error),
}

/// Why a render call failed. Every variant aborts the whole render.
#[remain::sorted]
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid service '{service}': {source}")]
    Binding {
        service: String,
        source: BindingError,
    },

    #[error("failed to load config {config} for service '{service}': {source}")]
    ConfigStore {
        service: String,
        config: String,
        source: ConfigError,
    },

    #[error("failed to evaluate {capability} for service '{service}': {source}")]
    Evaluation {
        service: String,
        capability: String,
        source: TemplatingError,
    },

    #[error("rendered workload {workload} for service '{service}' is not an object")]
    InvalidWorkloadOutput { service: String, workload: String },

    #[error("capability {capability} for service '{service}' is unavailable: {source}")]
    TemplateStore {
        service: String,
        capability: String,
        source: CapabilityError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type RenderResult<T> = Result<T, RenderError>;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum AppfileError {
    #[error("failed to apply {kind} {name}: {source}")]
    Apply {
        kind: String,
        name: String,
        source: ClientError,
    },

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Error that may occur while I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("json serialize/deserialize error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("yaml serialize/deserialize error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("invalid settings: {0}")]
    Settings(#[from] figment::Error),

    #[error("toml serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type AppfileResult<T> = Result<T, AppfileError>;
