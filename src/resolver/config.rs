//! Resolver configuration

use std::path::PathBuf;

use crate::config::EngineConfig;

/// Where the resolver finds manifests and source files
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub manifest_path: PathBuf,
    pub plugins_dir: PathBuf,
    /// Source root for built-in components
    pub templates_dir: PathBuf,
}

impl ResolverConfig {
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        plugins_dir: impl Into<PathBuf>,
        templates_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            plugins_dir: plugins_dir.into(),
            templates_dir: templates_dir.into(),
        }
    }
}

impl From<&EngineConfig> for ResolverConfig {
    fn from(config: &EngineConfig) -> Self {
        Self::new(
            config.manifest_path(),
            config.plugins_dir(),
            config.templates_dir(),
        )
    }
}
