//! JSON file project store

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use buildcost_core::{Project, ProjectStore, StoreError};

/// Keeps the whole project list in one pretty-printed JSON file
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Project>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No store at {:?}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let projects: Vec<Project> = serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("{}: {}", self.path.display(), e))
        })?;
        tracing::debug!(projects = projects.len(), "Loaded store from {:?}", self.path);
        Ok(projects)
    }

    fn save(&self, projects: &[Project]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(projects)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write beside the target and rename so a failed write keeps the old file
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content)?;
        fs::rename(&staging, &self.path)?;

        tracing::debug!(projects = projects.len(), "Saved store to {:?}", self.path);
        Ok(())
    }
}
