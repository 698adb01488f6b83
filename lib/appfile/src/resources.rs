//! Resources produced by a render, serialized the way the cluster expects them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppfileResult;

pub const OAM_API_VERSION: &str = "core.oam.dev/v1alpha2";
pub const WORKLOAD_TYPE_LABEL: &str = "workload.oam.dev/type";
pub const HEALTH_SCOPE_KEY: &str = "healthscopes.core.oam.dev";

const APPLICATION_KIND: &str = "Application";
const HEALTH_SCOPE_KIND: &str = "HealthScope";
const CONFIG_MAP_API_VERSION: &str = "v1";
const CONFIG_MAP_KIND: &str = "ConfigMap";

pub fn format_default_health_scope_name(app_name: &str) -> String {
    format!("{app_name}-default-health")
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Set by the apply step from the live object, never by rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

impl ObjectMeta {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ApplicationSpec,
}

impl Application {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            api_version: OAM_API_VERSION.to_string(),
            kind: APPLICATION_KIND.to_string(),
            metadata: ObjectMeta::new(name, namespace),
            spec: ApplicationSpec::default(),
        }
    }

    pub fn component(&self, name: &str) -> Option<&ApplicationComponent> {
        self.spec.components.iter().find(|c| c.name == name)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ApplicationSpec {
    pub components: Vec<ApplicationComponent>,
}

/// One rendered service.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationComponent {
    pub name: String,
    pub workload_type: String,

    /// Parameters the workload was evaluated with.
    pub settings: Map<String, Value>,
    pub workload: Value,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub traits: BTreeMap<String, ApplicationTrait>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scopes: BTreeMap<String, String>,
}

impl ApplicationComponent {
    /// Reference used by the health scope, taken from the rendered workload's type metadata.
    pub fn workload_reference(&self) -> WorkloadReference {
        let field = |key: &str| {
            self.workload
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        WorkloadReference {
            api_version: field("apiVersion"),
            kind: field("kind"),
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ApplicationTrait {
    /// Bound trait parameters.
    pub properties: Map<String, Value>,
    pub output: Value,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScope {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: HealthScopeSpec,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScopeSpec {
    pub workload_refs: Vec<WorkloadReference>,
}

impl HealthScope {
    /// Default health scope of `application`, watching every component.
    pub fn for_application(application: &Application) -> Self {
        Self {
            api_version: OAM_API_VERSION.to_string(),
            kind: HEALTH_SCOPE_KIND.to_string(),
            metadata: ObjectMeta::new(
                &format_default_health_scope_name(&application.metadata.name),
                &application.metadata.namespace,
            ),
            spec: HealthScopeSpec {
                workload_refs: application
                    .spec
                    .components
                    .iter()
                    .map(ApplicationComponent::workload_reference)
                    .collect(),
            },
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    pub fn new(metadata: ObjectMeta, data: BTreeMap<String, String>) -> Self {
        Self {
            api_version: CONFIG_MAP_API_VERSION.to_string(),
            kind: CONFIG_MAP_KIND.to_string(),
            metadata,
            data,
        }
    }
}

/// Object emitted next to the application.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AssistantObject {
    ConfigMap(ConfigMap),
    HealthScope(HealthScope),
}

impl AssistantObject {
    pub fn kind(&self) -> &str {
        match self {
            AssistantObject::ConfigMap(c) => &c.kind,
            AssistantObject::HealthScope(h) => &h.kind,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            AssistantObject::ConfigMap(c) => &c.metadata,
            AssistantObject::HealthScope(h) => &h.metadata,
        }
    }
}

/// Everything one render produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderOutput {
    pub application: Application,
    pub assistants: Vec<AssistantObject>,
}

impl RenderOutput {
    pub fn health_scope(&self) -> Option<&HealthScope> {
        self.assistants.iter().find_map(|a| match a {
            AssistantObject::HealthScope(h) => Some(h),
            AssistantObject::ConfigMap(_) => None,
        })
    }

    pub fn config_maps(&self) -> impl Iterator<Item = &ConfigMap> {
        self.assistants.iter().filter_map(|a| match a {
            AssistantObject::ConfigMap(c) => Some(c),
            AssistantObject::HealthScope(_) => None,
        })
    }

    /// Multi-document YAML stream, application first, then the assistant objects in order.
    pub fn to_yaml(&self) -> AppfileResult<String> {
        let mut documents = vec![serde_yaml::to_string(&self.application)?];
        for assistant in &self.assistants {
            documents.push(serde_yaml::to_string(assistant)?);
        }

        Ok(documents.join("---\n"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn component(name: &str, workload: Value) -> ApplicationComponent {
        ApplicationComponent {
            name: name.to_string(),
            workload_type: "webservice".to_string(),
            settings: Map::new(),
            workload,
            traits: BTreeMap::new(),
            scopes: BTreeMap::new(),
        }
    }

    fn application() -> Application {
        let mut application = Application::new("myapp", "default");
        application.spec.components = vec![
            component(
                "frontend",
                json!({"apiVersion": "apps/v1", "kind": "Deployment"}),
            ),
            component("worker", json!({"kind": "Job"})),
        ];
        application
    }

    #[test]
    fn health_scope_references_every_component() {
        let scope = HealthScope::for_application(&application());

        assert_eq!(scope.metadata.name, "myapp-default-health");
        assert_eq!(scope.metadata.namespace, "default");
        assert_eq!(
            scope.spec.workload_refs,
            vec![
                WorkloadReference {
                    api_version: "apps/v1".to_string(),
                    kind: "Deployment".to_string(),
                    name: "frontend".to_string(),
                },
                WorkloadReference {
                    api_version: String::new(),
                    kind: "Job".to_string(),
                    name: "worker".to_string(),
                },
            ]
        );
    }

    #[test]
    fn serializes_with_cluster_field_names() {
        let value = serde_json::to_value(HealthScope::for_application(&application())).unwrap();

        assert_eq!(value["apiVersion"], json!("core.oam.dev/v1alpha2"));
        assert_eq!(value["kind"], json!("HealthScope"));
        assert_eq!(value["spec"]["workloadRefs"][0]["name"], json!("frontend"));
        assert!(value["metadata"].get("labels").is_none());
    }

    #[test]
    fn assistant_objects_deserialize_by_shape() {
        let config_map = ConfigMap::new(
            ObjectMeta::new("kubevela-myapp-frontend-demo", "default"),
            BTreeMap::from([("A".to_string(), "1".to_string())]),
        );
        let value = serde_json::to_value(AssistantObject::ConfigMap(config_map.clone())).unwrap();

        let parsed: AssistantObject = serde_json::from_value(value).unwrap();

        assert_eq!(parsed, AssistantObject::ConfigMap(config_map));
        assert_eq!(parsed.kind(), "ConfigMap");
    }

    #[test]
    fn yaml_stream_puts_application_first() {
        let application = application();
        let output = RenderOutput {
            assistants: vec![AssistantObject::HealthScope(HealthScope::for_application(
                &application,
            ))],
            application,
        };

        let yaml = output.to_yaml().unwrap();
        let documents: Vec<&str> = yaml.split("---\n").collect();

        assert_eq!(documents.len(), 2);
        assert!(documents[0].contains("kind: Application"));
        assert!(documents[1].contains("kind: HealthScope"));
        assert!(output.health_scope().is_some());
        assert_eq!(output.config_maps().count(), 0);
    }
}
