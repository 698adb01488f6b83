use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::errors::{AppfileResult, BindingError};
use crate::service::Service;

/// Encoding of an appfile document.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum AppfileFormat {
    Json,
    Yaml,
}

impl AppfileFormat {
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            AppfileFormat::Json => &["json"],
            AppfileFormat::Yaml => &["yaml", "yml"],
        }
    }

    /// Format implied by the file extension of `path`, if any.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        AppfileFormat::iter().find(|f| f.extensions().contains(&extension))
    }

    /// Valid JSON text is JSON, anything else is treated as YAML.
    pub fn detect(bytes: &[u8]) -> Self {
        if serde_json::from_slice::<IgnoredAny>(bytes).is_ok() {
            AppfileFormat::Json
        } else {
            AppfileFormat::Yaml
        }
    }
}

/// The user-authored description of an application.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppFile {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub services: BTreeMap<String, Service>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, String>,
}

impl AppFile {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses an appfile. The extension of `hint` picks the format when it names one, otherwise
    /// the content decides.
    pub fn from_slice(bytes: &[u8], hint: Option<&Path>) -> AppfileResult<Self> {
        let format = hint
            .and_then(AppfileFormat::from_path)
            .unwrap_or_else(|| AppfileFormat::detect(bytes));

        Ok(match format {
            AppfileFormat::Json => serde_json::from_slice(bytes)?,
            AppfileFormat::Yaml => serde_yaml::from_slice(bytes)?,
        })
    }

    pub fn to_yaml(&self) -> AppfileResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    #[must_use]
    pub fn with_service<S: Into<String>>(mut self, name: S, service: Service) -> Self {
        self.services.insert(name.into(), service);
        self
    }

    /// Service names in render order.
    pub fn component_names(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Workload type of service `name` together with every non-trait field.
    pub fn workload<'a>(
        &'a self,
        name: &str,
        default_type: &'a str,
        trait_names: &[&str],
    ) -> Option<Result<(&'a str, BTreeMap<&'a str, &'a serde_json::Value>), BindingError>> {
        let service = self.service(name)?;
        Some(service.workload_type(default_type).map(|workload_type| {
            let fields = service
                .fields()
                .filter(|(k, _)| !trait_names.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), v))
                .collect();
            (workload_type, fields)
        }))
    }

    /// Properties of every trait attached to service `name`.
    pub fn traits<'a>(
        &'a self,
        name: &str,
        trait_names: &[&str],
    ) -> Option<Result<BTreeMap<&'a str, &'a serde_json::Map<String, serde_json::Value>>, BindingError>>
    {
        let service = self.service(name)?;
        Some(
            service
                .fields()
                .filter(|(k, _)| trait_names.contains(&k.as_str()))
                .map(|(k, v)| match v {
                    serde_json::Value::Object(properties) => Ok((k.as_str(), properties)),
                    _ => Err(BindingError::TraitNotMap(k.clone())),
                })
                .collect(),
        )
    }
}
