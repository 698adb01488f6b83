use std::error::Error;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::errors::{AppfileError, AppfileResult};
use crate::resources::{ObjectMeta, RenderOutput};

pub type ClientError = Box<dyn Error + Send + Sync>;

/// The cluster side of an apply.
pub trait ResourceClient {
    /// Resource version of the live object, `None` when it does not exist.
    fn resource_version(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
    ) -> Result<Option<String>, ClientError>;

    fn create(&self, object: &Value) -> Result<(), ClientError>;

    fn update(&self, object: &Value) -> Result<(), ClientError>;
}

/// Persists a render: assistant objects first, then the application. Each object is created when
/// the cluster does not have it yet, otherwise updated at the live resource version.
pub fn apply<C: ResourceClient + ?Sized>(client: &C, output: &RenderOutput) -> AppfileResult<()> {
    for assistant in &output.assistants {
        apply_object(client, assistant.kind(), assistant.metadata(), assistant)?;
    }

    let application = &output.application;
    apply_object(client, &application.kind, &application.metadata, application)
}

fn apply_object<C: ResourceClient + ?Sized, T: Serialize>(
    client: &C,
    kind: &str,
    metadata: &ObjectMeta,
    object: &T,
) -> AppfileResult<()> {
    let apply_error = |source: ClientError| AppfileError::Apply {
        kind: kind.to_string(),
        name: metadata.name.clone(),
        source,
    };

    let version = client
        .resource_version(kind, &metadata.name, &metadata.namespace)
        .map_err(apply_error)?;

    let mut value = serde_json::to_value(object)?;
    match version {
        Some(version) => {
            value["metadata"]["resourceVersion"] = Value::String(version);
            info!(kind, name = %metadata.name, "updating");
            client.update(&value).map_err(apply_error)
        }
        None => {
            info!(kind, name = %metadata.name, "creating");
            client.create(&value).map_err(apply_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::resources::{Application, AssistantObject, HealthScope};

    #[derive(Default)]
    struct FakeClient {
        live: BTreeMap<(String, String, String), String>,
        calls: RefCell<Vec<(String, Value)>>,
        fail_on: Option<String>,
    }

    impl FakeClient {
        fn record(&self, verb: &str, object: &Value) -> Result<(), ClientError> {
            if self.fail_on.as_deref() == object["kind"].as_str() {
                return Err("connection refused".into());
            }
            self.calls.borrow_mut().push((verb.to_string(), object.clone()));
            Ok(())
        }
    }

    impl ResourceClient for FakeClient {
        fn resource_version(
            &self,
            kind: &str,
            name: &str,
            namespace: &str,
        ) -> Result<Option<String>, ClientError> {
            Ok(self
                .live
                .get(&(kind.to_string(), name.to_string(), namespace.to_string()))
                .cloned())
        }

        fn create(&self, object: &Value) -> Result<(), ClientError> {
            self.record("create", object)
        }

        fn update(&self, object: &Value) -> Result<(), ClientError> {
            self.record("update", object)
        }
    }

    fn output() -> RenderOutput {
        let application = Application::new("myapp", "default");
        RenderOutput {
            assistants: vec![AssistantObject::HealthScope(HealthScope::for_application(
                &application,
            ))],
            application,
        }
    }

    #[test]
    fn creates_missing_and_updates_existing() {
        let client = FakeClient {
            live: BTreeMap::from([(
                (
                    "Application".to_string(),
                    "myapp".to_string(),
                    "default".to_string(),
                ),
                "42".to_string(),
            )]),
            ..FakeClient::default()
        };

        apply(&client, &output()).unwrap();

        let calls = client.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "create");
        assert_eq!(calls[0].1["kind"], json!("HealthScope"));
        assert!(calls[0].1["metadata"].get("resourceVersion").is_none());
        assert_eq!(calls[1].0, "update");
        assert_eq!(calls[1].1["kind"], json!("Application"));
        assert_eq!(calls[1].1["metadata"]["resourceVersion"], json!("42"));
    }

    #[test]
    fn client_failure_names_the_object() {
        let client = FakeClient {
            fail_on: Some("HealthScope".to_string()),
            ..FakeClient::default()
        };

        let err = apply(&client, &output()).unwrap_err();

        assert!(matches!(
            &err,
            AppfileError::Apply { kind, name, .. } if kind == "HealthScope" && name == "myapp-default-health"
        ));
        assert!(client.calls.borrow().is_empty());
    }
}
