use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::ConfigError;
use crate::resources::{ConfigMap, ObjectMeta};
use crate::settings::Environment;

pub const CONFIG_STORE_LABEL: &str = "config.oam.dev/store";

const CONFIGS_DIR: &str = "configs";

/// Source of named configuration sets, scoped by environment.
pub trait ConfigStore {
    /// Short identifier recorded on generated config maps.
    fn kind(&self) -> &str;

    fn get_config_data(&self, name: &str, environment: &str) -> Result<Vec<u8>, ConfigError>;
}

/// Reads `<root>/<environment>/configs/<name>`.
#[derive(Clone, Debug)]
pub struct LocalConfigStore {
    root: PathBuf,
}

impl LocalConfigStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn config_path(&self, name: &str, environment: &str) -> PathBuf {
        self.root.join(environment).join(CONFIGS_DIR).join(name)
    }
}

impl ConfigStore for LocalConfigStore {
    fn kind(&self) -> &str {
        "local"
    }

    fn get_config_data(&self, name: &str, environment: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.config_path(name, environment);
        debug!(path = ?path, "reading config");
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound {
                name: name.to_string(),
                environment: environment.to_string(),
            },
            _ => ConfigError::Io(e),
        })
    }
}

/// Decodes `KEY=VALUE` lines. Blank lines and lines starting with `#` are ignored, surrounding
/// whitespace is trimmed and a later key replaces an earlier one.
pub fn decode_config(data: &[u8]) -> Result<BTreeMap<String, String>, ConfigError> {
    let content = std::str::from_utf8(data)?;

    let mut decoded = BTreeMap::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::InvalidLine {
                line: index + 1,
                content: line.to_string(),
            });
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::InvalidLine {
                line: index + 1,
                content: line.to_string(),
            });
        }
        decoded.insert(key.to_string(), value.trim().to_string());
    }

    Ok(decoded)
}

pub fn gen_config_map_name(app_name: &str, service_name: &str, config_name: &str) -> String {
    format!("kubevela-{app_name}-{service_name}-{config_name}")
}

/// Config map holding `data` in the namespace of `environment`.
pub fn to_config_map<S: ConfigStore + ?Sized>(
    store: &S,
    name: &str,
    environment: &Environment,
    data: BTreeMap<String, String>,
) -> ConfigMap {
    let mut metadata = ObjectMeta::new(name, &environment.namespace);
    metadata
        .labels
        .insert(CONFIG_STORE_LABEL.to_string(), store.kind().to_string());

    ConfigMap::new(metadata, data)
}
