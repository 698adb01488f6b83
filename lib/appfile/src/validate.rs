use capability::TemplateStore;

use crate::appfile::AppFile;
use crate::errors::ValidationError;

impl AppFile {
    /// Structural checks run before rendering. The first failing rule is reported.
    pub fn validate(&self, store: &TemplateStore) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::NameRequired);
        }

        if self.services.is_empty() {
            return Err(ValidationError::NoServices);
        }

        for (service_name, service) in &self.services {
            if let Some(trait_name) = service.invalid_traits(store).next() {
                return Err(ValidationError::TraitNotMap {
                    trait_name: trait_name.to_string(),
                    service: service_name.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    fn appfile(value: serde_json::Value) -> AppFile {
        serde_json::from_value(value).unwrap()
    }

    #[test_case(json!({"services": {"frontend": {"image": "busybox"}}}) => "name is required"; "missing name")]
    #[test_case(json!({"name": "", "services": {}}) => "name is required"; "name checked first")]
    #[test_case(json!({"name": "myapp"}) => "at least one service is required"; "no services")]
    #[test_case(json!({"name": "myapp", "services": {"frontend": {"image": "busybox", "autoscaling": 10}}}) => "trait autoscaling in 'frontend' must be map"; "scalar trait")]
    #[test_case(json!({"name": "myapp", "services": {"web": {"rollout": ["a"]}}}) => "trait rollout in 'web' must be map"; "list trait")]
    fn rejects(value: serde_json::Value) -> String {
        appfile(value)
            .validate(&testing::fixtures::template_store())
            .unwrap_err()
            .to_string()
    }

    #[test_case(json!({"name": "myapp", "services": {"frontend": {"image": "busybox"}}}); "plain service")]
    #[test_case(json!({"name": "myapp", "services": {"frontend": {"autoscaling": {"max": 3}}}}); "trait map")]
    #[test_case(json!({"name": "myapp", "services": {"frontend": {"route": 10}}}); "unknown capability is not checked here")]
    #[test_case(json!({"name": "myapp", "services": {"frontend": {"config": "demo", "type": "cloneset"}}}); "reserved fields")]
    fn accepts(value: serde_json::Value) {
        assert_eq!(
            appfile(value).validate(&testing::fixtures::template_store()),
            Ok(())
        );
    }

    #[test]
    fn first_failing_service_in_name_order_is_reported() {
        let appfile = appfile(json!({
            "name": "myapp",
            "services": {
                "zeta": {"autoscaling": 1},
                "alpha": {"rollout": "fast"}
            }
        }));

        assert_eq!(
            appfile.validate(&testing::fixtures::template_store()),
            Err(ValidationError::TraitNotMap {
                trait_name: "rollout".to_string(),
                service: "alpha".to_string(),
            })
        );
    }
}
