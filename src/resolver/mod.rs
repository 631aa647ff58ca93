//! Dependency resolution for confstrap components
//!
//! This module handles:
//! - Loading the base manifest and every plugin manifest
//! - Merging their namespaces ([`namespace`])
//! - Transitive dependency closure with cycle and depth checks ([`graph`])
//! - File pattern, destination and capability conflict detection ([`validation`])
//! - Priority-aware topological ordering ([`sort`])
//!
//! Resolution never touches the target directory.

pub mod config;
pub mod graph;
pub mod namespace;
pub mod sort;
pub mod validation;

pub use config::ResolverConfig;
pub use graph::MAX_DEPENDENCY_DEPTH;
pub use namespace::Namespace;

use crate::config::plugin::discover_plugins;
use crate::config::{ComponentConfig, Manifest};
use crate::domain::ResolvedSpec;
use crate::error::{Result, manifest as manifest_error};

/// Turns a profile or explicit component list into an ordered [`ResolvedSpec`]
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Load the base manifest and plugins into one namespace
    pub fn namespace(&self) -> Result<Namespace> {
        let manifest = Manifest::load(&self.config.manifest_path)?;
        let plugins = discover_plugins(&self.config.plugins_dir)?;
        Ok(Namespace::build(manifest, plugins))
    }

    /// Resolve a profile, or `target_components` when given
    ///
    /// With explicit components the profile is only a label and need not be
    /// defined.
    pub fn resolve(
        &self,
        profile: &str,
        target_components: Option<&[String]>,
    ) -> Result<ResolvedSpec> {
        let namespace = self.namespace()?;
        self.resolve_in(namespace, profile, target_components)
    }

    /// Resolve against an already loaded namespace
    pub fn resolve_in(
        &self,
        namespace: Namespace,
        profile: &str,
        target_components: Option<&[String]>,
    ) -> Result<ResolvedSpec> {
        let (requested, requested_by): (Vec<String>, String) = match target_components {
            Some(ids) => (ids.to_vec(), "the command line".to_string()),
            None => {
                let definition = namespace
                    .profile(profile)
                    .ok_or_else(|| manifest_error::profile_not_found(profile, namespace.profiles.keys()))?;
                (definition.components.clone(), format!("profile '{profile}'"))
            }
        };

        let closure = graph::dependency_closure(&requested, &namespace.components, &requested_by)?;
        let resolved: Vec<ComponentConfig> = closure
            .iter()
            .filter_map(|id| namespace.components.get(id).cloned())
            .collect();

        validation::detect_conflicts(&resolved)?;
        validation::detect_destination_conflicts(&resolved, &self.config.templates_dir)?;
        let components = sort::priority_order(resolved)?;

        let manifest_digest = namespace.manifest.digest();
        log::info!(
            "Resolved {} component(s) for profile '{}': {}",
            components.len(),
            profile,
            components
                .iter()
                .map(|c| c.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ResolvedSpec {
            profile: profile.to_string(),
            components,
            plugins: namespace.plugins,
            manifest_digest,
            template_root: self.config.templates_dir.clone(),
        })
    }
}
