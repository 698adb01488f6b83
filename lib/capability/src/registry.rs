use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::template::{CapabilityKind, CapabilityTemplate};
use crate::{CapabilityError, CapabilityResult};

const DEFINITION_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Source of installed capabilities.
pub trait CapabilityRegistry {
    fn list_by_kind(&self, kind: CapabilityKind) -> CapabilityResult<Vec<CapabilityTemplate>>;
}

/// Registry over templates already held in memory.
#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    templates: Vec<CapabilityTemplate>,
}

impl StaticRegistry {
    pub fn new(templates: Vec<CapabilityTemplate>) -> Self {
        Self { templates }
    }

    /// Parses each definition in turn.
    pub fn from_definitions<S: AsRef<str>>(definitions: &[S]) -> CapabilityResult<Self> {
        let templates = definitions
            .iter()
            .map(|d| CapabilityTemplate::from_yaml_str(d.as_ref(), None))
            .collect::<CapabilityResult<Vec<CapabilityTemplate>>>()?;

        Ok(Self { templates })
    }
}

impl CapabilityRegistry for StaticRegistry {
    fn list_by_kind(&self, kind: CapabilityKind) -> CapabilityResult<Vec<CapabilityTemplate>> {
        Ok(self
            .templates
            .iter()
            .filter(|t| t.kind == kind)
            .cloned()
            .collect())
    }
}

/// Registry reading one definition per file from a directory tree.
#[derive(Clone, Debug)]
pub struct DirectoryRegistry {
    root: PathBuf,
}

impl DirectoryRegistry {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn load(path: &Path) -> CapabilityResult<CapabilityTemplate> {
        let content = fs::read_to_string(path)?;
        CapabilityTemplate::from_yaml_str(&content, Some(path.to_string_lossy().to_string()))
    }
}

impl CapabilityRegistry for DirectoryRegistry {
    fn list_by_kind(&self, kind: CapabilityKind) -> CapabilityResult<Vec<CapabilityTemplate>> {
        let mut templates = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_definition_file(entry.path()) {
                continue;
            }

            let template =
                Self::load(entry.path()).map_err(|e| CapabilityError::InvalidDefinition {
                    path: entry.path().to_string_lossy().to_string(),
                    source: Box::new(e),
                })?;

            if template.kind == kind {
                debug!(name = %template.name, path = ?entry.path(), "found {kind} capability");
                templates.push(template);
            }
        }

        Ok(templates)
    }
}

fn is_definition_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DEFINITION_EXTENSIONS.contains(&e))
}
