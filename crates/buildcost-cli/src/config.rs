//! Configuration file handling
//!
//! Settings come from `buildcost.toml` in the working directory, or from the
//! file named by `--config` / `BUILDCOST_CONFIG`. Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "buildcost.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON project store
    pub store: PathBuf,
    /// Currency symbol used in reports and workbooks
    pub currency: String,
    /// Populate an empty store with the demo projects
    pub seed_sample: bool,
    /// Directory for exported workbooks
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: PathBuf::from("projects.json"),
            currency: buildcost_render::DEFAULT_CURRENCY.to_string(),
            seed_sample: true,
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Parse a config file; unknown keys are ignored
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// An explicit path must exist. Without one, `buildcost.toml` is used
    /// when present and defaults otherwise.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            Self::from_file(local)
        } else {
            tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Ok(Self::default())
        }
    }
}
