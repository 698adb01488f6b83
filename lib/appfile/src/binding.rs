use capability::CapabilityTemplate;
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::BindingError;

/// Binds `supplied` values to the parameters declared by `template`.
///
/// Each declared parameter takes the supplied value, else its default. A required parameter with
/// neither is an error. Unbound optional parameters are left out. Supplied keys the template does
/// not declare are an error when `strict`, otherwise they are dropped with a warning.
pub fn bind(
    template: &CapabilityTemplate,
    supplied: &Map<String, Value>,
    strict: bool,
) -> Result<Map<String, Value>, BindingError> {
    for name in supplied.keys() {
        if template.has_parameter(name) {
            continue;
        }

        if strict {
            return Err(BindingError::UnknownParameter {
                capability: template.name.clone(),
                parameter: name.clone(),
            });
        }
        warn!(capability = %template.name, parameter = %name, "skipping unknown parameter");
    }

    let mut bound = Map::new();
    for spec in &template.parameters {
        match supplied.get(&spec.name).or(spec.default.as_ref()) {
            Some(value) => {
                bound.insert(spec.name.clone(), value.clone());
            }
            None if spec.required => {
                return Err(BindingError::MissingRequired {
                    capability: template.name.clone(),
                    parameter: spec.name.clone(),
                });
            }
            None => {}
        }
    }

    Ok(bound)
}
