use std::collections::BTreeMap;

use capability::{CapabilityKind, CapabilityTemplate, TemplateStore};
use document::Node;
use serde_json::{Map, Value};
use templating::{Evaluator, TemplateContext};
use tracing::{debug, info, trace, Level};

use crate::appfile::AppFile;
use crate::binding::bind;
use crate::config::{decode_config, gen_config_map_name, to_config_map, ConfigStore};
use crate::errors::{BindingError, ConfigError, RenderError, RenderResult};
use crate::resources::{
    Application, ApplicationComponent, ApplicationTrait, AssistantObject, ConfigMap, HealthScope,
    RenderOutput, HEALTH_SCOPE_KEY, WORKLOAD_TYPE_LABEL,
};
use crate::service::Service;
use crate::settings::RenderSettings;

/// Turns appfiles into applications using one read-only set of capabilities.
///
/// A renderer holds no mutable state, so one instance can serve any number of renders.
pub struct Renderer<'a> {
    store: &'a TemplateStore,
    evaluator: &'a dyn Evaluator,
    config_store: Option<&'a dyn ConfigStore>,
    settings: RenderSettings,
}

impl<'a> Renderer<'a> {
    pub fn new(
        store: &'a TemplateStore,
        evaluator: &'a dyn Evaluator,
        settings: RenderSettings,
    ) -> Self {
        Self {
            store,
            evaluator,
            config_store: None,
            settings,
        }
    }

    /// Store used for services with a `config` field. Without one such services fail to render.
    #[must_use]
    pub fn with_config_store(mut self, config_store: &'a dyn ConfigStore) -> Self {
        self.config_store = Some(config_store);
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Validates and renders `appfile`.
    ///
    /// Services are rendered in name order. The first failure aborts the render and nothing is
    /// returned for the services rendered before it.
    pub fn render(&self, appfile: &AppFile) -> RenderResult<RenderOutput> {
        appfile.validate(self.store)?;

        let mut application = Application::new(&appfile.name, &self.settings.environment.namespace);
        let mut assistants = Vec::new();
        for (service_name, service) in &appfile.services {
            info!(app = %appfile.name, service = %service_name, "rendering service");

            let config_name = service
                .config_name()
                .map_err(|source| RenderError::Binding {
                    service: service_name.clone(),
                    source,
                })?;
            if let Some(config_name) = config_name {
                let config_map = self.render_config(&appfile.name, service_name, config_name)?;
                assistants.push(AssistantObject::ConfigMap(config_map));
            }

            let component = self.render_service(&appfile.name, service_name, service)?;
            application.spec.components.push(component);
        }

        let health_scope = HealthScope::for_application(&application);
        for component in &mut application.spec.components {
            component
                .scopes
                .insert(HEALTH_SCOPE_KEY.to_string(), health_scope.metadata.name.clone());
        }
        assistants.push(AssistantObject::HealthScope(health_scope));

        Ok(RenderOutput {
            application,
            assistants,
        })
    }

    fn render_config(
        &self,
        app_name: &str,
        service_name: &str,
        config_name: &str,
    ) -> RenderResult<ConfigMap> {
        let config_error = |source: ConfigError| RenderError::ConfigStore {
            service: service_name.to_string(),
            config: config_name.to_string(),
            source,
        };

        let store = self
            .config_store
            .ok_or_else(|| config_error(ConfigError::Unavailable))?;
        let environment = &self.settings.environment;
        let data = store
            .get_config_data(config_name, &environment.name)
            .map_err(config_error)?;
        let decoded = decode_config(&data).map_err(config_error)?;
        debug!(config = %config_name, entries = decoded.len(), "decoded config");

        Ok(to_config_map(
            store,
            &gen_config_map_name(app_name, service_name, config_name),
            environment,
            decoded,
        ))
    }

    fn render_service(
        &self,
        app_name: &str,
        service_name: &str,
        service: &Service,
    ) -> RenderResult<ApplicationComponent> {
        let strict = self.settings.strict;
        let binding_error = |source: BindingError| RenderError::Binding {
            service: service_name.to_string(),
            source,
        };

        let workload_type = service
            .workload_type(&self.settings.default_workload_type)
            .map_err(binding_error)?;
        let workload_template = self
            .store
            .get(CapabilityKind::Workload, workload_type)
            .map_err(|source| RenderError::TemplateStore {
                service: service_name.to_string(),
                capability: workload_type.to_string(),
                source,
            })?;
        let partition = service
            .partition(workload_template, self.store, strict)
            .map_err(binding_error)?;

        let context = TemplateContext::for_component(
            service_name,
            app_name,
            &self.settings.environment.namespace,
        );

        let settings = bind(workload_template, &partition.workload, strict).map_err(binding_error)?;
        let mut workload = self.evaluate(service_name, workload_template, &settings, &context)?;
        label_workload(&mut workload, workload_type).ok_or_else(|| {
            RenderError::InvalidWorkloadOutput {
                service: service_name.to_string(),
                workload: workload_type.to_string(),
            }
        })?;
        if tracing::enabled!(Level::TRACE) {
            if let Ok(printed) = document::print(&Node::from(&workload)) {
                trace!(service = %service_name, "rendered workload\n{printed}");
            }
        }

        let mut traits = BTreeMap::new();
        for (trait_name, properties) in &partition.traits {
            let template = self
                .store
                .get(CapabilityKind::Trait, trait_name)
                .map_err(|source| RenderError::TemplateStore {
                    service: service_name.to_string(),
                    capability: trait_name.clone(),
                    source,
                })?;
            let properties = bind(template, properties, strict).map_err(binding_error)?;
            let output = self.evaluate(service_name, template, &properties, &context)?;
            traits.insert(trait_name.clone(), ApplicationTrait { properties, output });
        }

        Ok(ApplicationComponent {
            name: service_name.to_string(),
            workload_type: workload_type.to_string(),
            settings,
            workload,
            traits,
            scopes: BTreeMap::new(),
        })
    }

    fn evaluate(
        &self,
        service_name: &str,
        template: &CapabilityTemplate,
        parameters: &Map<String, Value>,
        context: &TemplateContext,
    ) -> RenderResult<Value> {
        self.evaluator
            .evaluate(template, parameters, context)
            .map_err(|source| RenderError::Evaluation {
                service: service_name.to_string(),
                capability: template.name.clone(),
                source,
            })
    }
}

/// Sets the workload type label under `metadata.labels`. `None` when the workload, its metadata or
/// its labels are not objects.
fn label_workload(workload: &mut Value, workload_type: &str) -> Option<()> {
    let metadata = workload
        .as_object_mut()?
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    let labels = metadata
        .as_object_mut()?
        .entry("labels")
        .or_insert_with(|| Value::Object(Map::new()));
    labels.as_object_mut()?.insert(
        WORKLOAD_TYPE_LABEL.to_string(),
        Value::String(workload_type.to_string()),
    );

    Some(())
}
