//! Capability templates: parameterized workload and trait blueprints and the store that indexes them.

mod registry;
mod store;
mod template;

use thiserror::Error;

pub use registry::{CapabilityRegistry, DirectoryRegistry, StaticRegistry};
pub use store::TemplateStore;
pub use template::{CapabilityKind, CapabilityTemplate, ParameterSpec, ParameterType};

#[remain::sorted]
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error(transparent)]
    Document(#[from] document::DocumentError),

    #[error("invalid capability definition {path}: {source}")]
    InvalidDefinition {
        path: String,
        source: Box<CapabilityError>,
    },

    /// Error that may occur while I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("yaml serialize/deserialize error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),
}

pub type CapabilityResult<T> = Result<T, CapabilityError>;
