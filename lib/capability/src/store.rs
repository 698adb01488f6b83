use tracing::debug;

use crate::registry::CapabilityRegistry;
use crate::template::{CapabilityKind, CapabilityTemplate};
use crate::{CapabilityError, CapabilityResult};

/// Read-only index of the capabilities available to one render session.
///
/// Built once from a [`CapabilityRegistry`] and never mutated afterwards, so a single store can be
/// shared between concurrent renders.
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    workloads: Vec<CapabilityTemplate>,
    traits: Vec<CapabilityTemplate>,
}

impl TemplateStore {
    pub fn new<I: IntoIterator<Item = CapabilityTemplate>>(templates: I) -> Self {
        let (workloads, traits) = templates
            .into_iter()
            .partition(|t| t.kind == CapabilityKind::Workload);

        Self { workloads, traits }
    }

    pub fn load<R: CapabilityRegistry + ?Sized>(registry: &R) -> CapabilityResult<Self> {
        let workloads = registry.list_by_kind(CapabilityKind::Workload)?;
        let traits = registry.list_by_kind(CapabilityKind::Trait)?;
        debug!(
            workloads = workloads.len(),
            traits = traits.len(),
            "loaded capability templates"
        );

        Ok(Self { workloads, traits })
    }

    pub fn list_by_kind(&self, kind: CapabilityKind) -> &[CapabilityTemplate] {
        match kind {
            CapabilityKind::Workload => &self.workloads,
            CapabilityKind::Trait => &self.traits,
        }
    }

    /// Finds a capability of any kind. Names are expected to be unique; the first match wins.
    pub fn get_by_name(&self, name: &str) -> CapabilityResult<&CapabilityTemplate> {
        self.workloads
            .iter()
            .chain(self.traits.iter())
            .find(|t| t.name == name)
            .ok_or_else(|| CapabilityError::NotFound(name.to_string()))
    }

    pub fn get(&self, kind: CapabilityKind, name: &str) -> CapabilityResult<&CapabilityTemplate> {
        self.list_by_kind(kind)
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CapabilityError::NotFound(format!("{kind} {name}")))
    }

    pub fn is_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.name == name)
    }

    pub fn trait_names(&self) -> impl Iterator<Item = &str> {
        self.traits.iter().map(|t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticRegistry;

    fn store() -> TemplateStore {
        let registry = StaticRegistry::from_definitions(&[
            "name: webservice\nkind: workload\ntemplate: {}\n",
            "name: autoscaling\nkind: trait\ntemplate: {}\n",
            "name: rollout\nkind: trait\ntemplate: {}\n",
        ])
        .unwrap();

        TemplateStore::load(&registry).unwrap()
    }

    #[test]
    fn lists_by_kind() {
        let store = store();

        assert_eq!(store.list_by_kind(CapabilityKind::Workload).len(), 1);
        assert_eq!(
            store.trait_names().collect::<Vec<&str>>(),
            vec!["autoscaling", "rollout"]
        );
    }

    #[test]
    fn get_by_name_searches_all_kinds() {
        let store = store();

        assert_eq!(store.get_by_name("rollout").unwrap().kind, CapabilityKind::Trait);
        assert_eq!(
            store.get_by_name("webservice").unwrap().kind,
            CapabilityKind::Workload
        );
        assert!(matches!(
            store.get_by_name("route"),
            Err(CapabilityError::NotFound(name)) if name == "route"
        ));
    }

    #[test]
    fn get_respects_kind() {
        let store = store();

        assert!(store.get(CapabilityKind::Trait, "autoscaling").is_ok());
        assert!(store.get(CapabilityKind::Workload, "autoscaling").is_err());
        assert!(store.is_trait("autoscaling"));
        assert!(!store.is_trait("webservice"));
    }
}
