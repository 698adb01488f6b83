//! Appfile model and the renderer turning it into a deployable resource graph.
//!
//! An [`AppFile`] names a set of services. Each service selects a workload capability and may
//! attach traits. [`Renderer::render`] validates the appfile, binds every service's fields against
//! the capability templates of a [`capability::TemplateStore`] and evaluates them into an
//! [`Application`] plus side objects ([`AssistantObject`]).

mod apply;
mod appfile;
mod binding;
mod config;
mod errors;
mod render;
mod resources;
mod service;
mod settings;
mod validate;

pub use apply::{apply, ClientError, ResourceClient};
pub use appfile::{AppFile, AppfileFormat};
pub use binding::bind;
pub use config::{
    decode_config, gen_config_map_name, to_config_map, ConfigStore, LocalConfigStore,
    CONFIG_STORE_LABEL,
};
pub use errors::{
    AppfileError, AppfileResult, BindingError, ConfigError, RenderError, RenderResult,
    ValidationError,
};
pub use render::Renderer;
pub use resources::{
    format_default_health_scope_name, Application, ApplicationComponent, ApplicationSpec,
    ApplicationTrait, AssistantObject, ConfigMap, HealthScope, HealthScopeSpec, ObjectMeta,
    RenderOutput, WorkloadReference, HEALTH_SCOPE_KEY, OAM_API_VERSION, WORKLOAD_TYPE_LABEL,
};
pub use service::{Partition, Service, BUILD_FIELD, CONFIG_FIELD, TYPE_FIELD};
pub use settings::{Environment, RenderSettings, DEFAULT_WORKLOAD_TYPE, SETTINGS_ENV_PREFIX};
