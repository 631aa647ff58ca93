//! Engine configuration
//!
//! Built once per invocation from CLI flags (with environment fallbacks) and
//! handed to [`crate::operations::Engine::open`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::manifest::MANIFEST_FILE;

/// Directory under the target that holds engine state
pub const STATE_DIR: &str = ".confstrap";

/// Configuration directories scanned for orphans by default
pub const DEFAULT_CONFIG_DIRS: &[&str] = &[".claude"];

/// Paths and variables for one engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub target_dir: PathBuf,
    /// Explicit manifest path; defaults to `<target>/confstrap.yaml`
    pub manifest: Option<PathBuf>,
    /// Defaults to `<manifest dir>/plugins`
    pub plugins_dir: Option<PathBuf>,
    /// Defaults to `<manifest dir>/templates`
    pub templates_dir: Option<PathBuf>,
    /// Template variables supplied by the caller
    pub variables: BTreeMap<String, String>,
    /// Extra directories (relative to the target) scanned for orphans
    pub config_dirs: Vec<String>,
}

impl EngineConfig {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            manifest: None,
            plugins_dir: None,
            templates_dir: None,
            variables: BTreeMap::new(),
            config_dirs: DEFAULT_CONFIG_DIRS.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    pub fn with_plugins_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.plugins_dir = Some(path.into());
        self
    }

    pub fn with_templates_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(path.into());
        self
    }

    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.target_dir.join(MANIFEST_FILE))
    }

    fn manifest_dir(&self) -> PathBuf {
        self.manifest_path()
            .parent()
            .map_or_else(|| self.target_dir.clone(), Path::to_path_buf)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.plugins_dir
            .clone()
            .unwrap_or_else(|| self.manifest_dir().join("plugins"))
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.templates_dir
            .clone()
            .unwrap_or_else(|| self.manifest_dir().join("templates"))
    }

    /// `<target>/.confstrap`
    pub fn state_dir(&self) -> PathBuf {
        self.target_dir.join(STATE_DIR)
    }
}
