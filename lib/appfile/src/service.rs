use std::collections::BTreeMap;

use capability::{CapabilityTemplate, TemplateStore};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::BindingError;

/// Selects the workload capability.
pub const TYPE_FIELD: &str = "type";
/// Names an external configuration set rendered into a config map.
pub const CONFIG_FIELD: &str = "config";
/// Image build section. Used by the build helper, never rendered.
pub const BUILD_FIELD: &str = "build";

const RESERVED_FIELDS: [&str; 3] = [TYPE_FIELD, CONFIG_FIELD, BUILD_FIELD];

/// One service of an appfile, kept as the open mapping the user wrote.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Service(pub IndexMap<String, Value>);

/// Service fields split by the capability that consumes them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
    pub workload: Map<String, Value>,
    pub traits: BTreeMap<String, Map<String, Value>>,
}

impl Service {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The workload capability name, or `default` when the service has no `type`.
    pub fn workload_type<'a>(&'a self, default: &'a str) -> Result<&'a str, BindingError> {
        Ok(self.reserved(TYPE_FIELD)?.unwrap_or(default))
    }

    pub fn config_name(&self) -> Result<Option<&str>, BindingError> {
        self.reserved(CONFIG_FIELD)
    }

    fn reserved(&self, field: &str) -> Result<Option<&str>, BindingError> {
        match self.0.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(BindingError::InvalidReservedField(field.to_string())),
        }
    }

    /// Every field except the reserved ones, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| !RESERVED_FIELDS.contains(&k.as_str()))
    }

    /// Trait fields whose value is not a mapping.
    pub fn invalid_traits<'a>(&'a self, store: &'a TemplateStore) -> impl Iterator<Item = &'a str> {
        self.fields()
            .filter(|(k, v)| store.is_trait(k) && !v.is_object())
            .map(|(k, _)| k.as_str())
    }

    /// Splits fields between the workload and the traits.
    ///
    /// A field declared as a parameter of `workload` binds to the workload even when a trait of
    /// the same name exists. Otherwise a field named after a trait must be a mapping of that
    /// trait's properties. Anything else is an [`BindingError::UnknownField`], or is logged and
    /// skipped when `strict` is off.
    pub fn partition(
        &self,
        workload: &CapabilityTemplate,
        store: &TemplateStore,
        strict: bool,
    ) -> Result<Partition, BindingError> {
        let mut partition = Partition::default();
        for (name, value) in self.fields() {
            if workload.has_parameter(name) {
                debug!(field = %name, workload = %workload.name, "workload field");
                partition.workload.insert(name.clone(), value.clone());
            } else if store.is_trait(name) {
                let Value::Object(properties) = value else {
                    return Err(BindingError::TraitNotMap(name.clone()));
                };
                debug!(field = %name, "trait field");
                partition.traits.insert(name.clone(), properties.clone());
            } else if strict {
                return Err(BindingError::UnknownField {
                    field: name.clone(),
                    workload: workload.name.clone(),
                });
            } else {
                warn!(field = %name, workload = %workload.name, "skipping unknown field");
            }
        }

        Ok(partition)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Service {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use capability::CapabilityKind;
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    fn service(value: Value) -> Service {
        serde_json::from_value(value).unwrap()
    }

    #[test_case(json!({"image": "nginx"}) => Ok("webservice".to_string()); "defaults")]
    #[test_case(json!({"type": "cloneset"}) => Ok("cloneset".to_string()); "explicit")]
    #[test_case(json!({"type": 3}) => Err(BindingError::InvalidReservedField("type".to_string())); "not a string")]
    fn workload_type(value: Value) -> Result<String, BindingError> {
        service(value).workload_type("webservice").map(str::to_string)
    }

    #[test]
    fn fields_skip_reserved_keys_and_keep_order() {
        let service = service(json!({
            "type": "webservice",
            "image": "nginx",
            "config": "demo",
            "build": {"docker": {"file": "Dockerfile"}},
            "port": 80
        }));

        let fields: Vec<&str> = service.fields().map(|(k, _)| k.as_str()).collect();

        assert_eq!(fields, vec!["image", "port"]);
        assert_eq!(service.config_name(), Ok(Some("demo")));
    }

    #[test]
    fn partition_splits_workload_and_traits() {
        let store = testing::fixtures::template_store();
        let webservice = store.get(CapabilityKind::Workload, "webservice").unwrap();
        let service = service(json!({
            "image": "inanimate/echo-server",
            "env": {"PORT": 8080},
            "autoscaling": {"max": 10, "min": 1}
        }));

        let partition = service.partition(webservice, &store, true).unwrap();

        assert_eq!(
            Value::Object(partition.workload),
            json!({"image": "inanimate/echo-server", "env": {"PORT": 8080}})
        );
        assert_eq!(partition.traits.len(), 1);
        assert_eq!(
            Value::Object(partition.traits["autoscaling"].clone()),
            json!({"max": 10, "min": 1})
        );
    }

    #[test]
    fn trait_must_be_map() {
        let store = testing::fixtures::template_store();
        let webservice = store.get(CapabilityKind::Workload, "webservice").unwrap();

        let result = service(json!({"image": "a", "rollout": "fast"})).partition(webservice, &store, true);

        assert_eq!(result, Err(BindingError::TraitNotMap("rollout".to_string())));
    }

    #[test]
    fn unknown_field_depends_on_strictness() {
        let store = testing::fixtures::template_store();
        let webservice = store.get(CapabilityKind::Workload, "webservice").unwrap();
        let service = service(json!({"image": "a", "volumes": ["/data"]}));

        assert_eq!(
            service.partition(webservice, &store, true),
            Err(BindingError::UnknownField {
                field: "volumes".to_string(),
                workload: "webservice".to_string(),
            })
        );

        let partition = service.partition(webservice, &store, false).unwrap();
        assert_eq!(Value::Object(partition.workload), json!({"image": "a"}));
        assert!(partition.traits.is_empty());
    }

    #[test]
    fn invalid_traits() {
        let store = testing::fixtures::template_store();
        let service = service(json!({"autoscaling": 10, "rollout": {}, "image": "a"}));

        assert_eq!(service.invalid_traits(&store).collect::<Vec<&str>>(), vec!["autoscaling"]);
    }
}
