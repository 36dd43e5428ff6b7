use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Optional YAML configuration. Everything here can also be supplied (or
/// overridden) on the command line; fade and hold timings are deliberately
/// not configurable.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Directory (or single file) played when no paths are given on the CLI.
    pub library_path: Option<PathBuf>,
    /// Deterministic shuffle seed; OS entropy when absent.
    pub startup_shuffle_seed: Option<u64>,
    /// Start in borderless fullscreen.
    pub start_fullscreen: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            library_path: None,
            startup_shuffle_seed: None,
            start_fullscreen: true,
        }
    }
}

impl Configuration {
    pub fn validated(self) -> Result<Self> {
        if let Some(path) = &self.library_path {
            ensure!(
                !path.as_os_str().is_empty(),
                "library-path must not be empty"
            );
        }
        Ok(self)
    }
}

pub fn from_yaml_file(path: &Path) -> Result<Configuration> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let cfg: Configuration = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    cfg.validated()
}
