use std::fs;
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::errors::AppfileResult;

pub const DEFAULT_WORKLOAD_TYPE: &str = "webservice";
pub const SETTINGS_ENV_PREFIX: &str = "APPFILE_";

const DEFAULT_ENVIRONMENT: &str = "default";

/// Target environment of a render.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Environment {
    pub name: String,
    pub namespace: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            name: DEFAULT_ENVIRONMENT.to_string(),
            namespace: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Workload capability used by services without a `type`.
    pub default_workload_type: String,

    /// Fail on service fields or trait properties no capability declares. When `false` they are
    /// logged and skipped.
    pub strict: bool,

    pub environment: Environment,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            default_workload_type: DEFAULT_WORKLOAD_TYPE.to_string(),
            strict: true,
            environment: Environment::default(),
        }
    }
}

impl RenderSettings {
    /// Defaults, overridden by the TOML file at `path` when given, then by `APPFILE_` environment
    /// variables. Nested keys use `__`, e.g. `APPFILE_ENVIRONMENT__NAMESPACE`.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> AppfileResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(RenderSettings::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path.as_ref()));
        }

        Ok(figment
            .merge(Env::prefixed(SETTINGS_ENV_PREFIX).split("__"))
            .extract()?)
    }

    /// Writes the settings as TOML, in the form [`RenderSettings::load`] reads back.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> AppfileResult<()> {
        fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }

    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    #[must_use]
    pub fn with_environment<S: Into<String>>(mut self, name: S, namespace: S) -> Self {
        self.environment = Environment {
            name: name.into(),
            namespace: namespace.into(),
        };
        self
    }
}
