//! High-level operations over one target directory
//!
//! [`Engine`] wires the pipeline together:
//! - Resolver: profile to ordered components (from resolver module)
//! - Planner: components to file actions (from planner module)
//! - Installer: staged execution with rollback (from installer module)
//! - Doctor: diagnosis and repair (from doctor module)
//!
//! One engine owns the receipt store, and with it the only receipt cache, for
//! the lifetime of an invocation. Every error leaving an operation names it.

pub mod install;
pub mod list;

pub use install::{InstallOptions, InstallOutcome};

use std::collections::{BTreeMap, BTreeSet};

use crate::config::EngineConfig;
use crate::domain::{Diagnostic, InstallPlan, ResolvedSpec};
use crate::doctor::{DiagnoseOptions, Doctor};
use crate::error::{Result, install as install_error};
use crate::merge::{PlaceholderRenderer, TemplateRenderer};
use crate::planner::{self, Planner};
use crate::receipts::ReceiptStore;
use crate::resolver::{Resolver, ResolverConfig};
use crate::transaction;

/// The confstrap pipeline bound to one configuration
pub struct Engine {
    config: EngineConfig,
    resolver: Resolver,
    receipts: ReceiptStore,
    renderer: Box<dyn TemplateRenderer>,
}

impl Engine {
    /// Create an engine, sweeping scratch dirs left by interrupted runs
    pub fn open(config: EngineConfig) -> Result<Self> {
        let swept = transaction::sweep_orphans(&config.target_dir)
            .map_err(|e| install_error::operation_failed("open", e))?;
        if swept > 0 {
            log::info!("Removed {swept} staging dir(s) left by an interrupted run");
        }

        Ok(Self {
            resolver: Resolver::new(ResolverConfig::from(&config)),
            receipts: ReceiptStore::new(&config.target_dir),
            renderer: Box::new(PlaceholderRenderer::new()),
            config,
        })
    }

    /// Replace the template renderer
    pub fn with_renderer(mut self, renderer: Box<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn receipts(&self) -> &ReceiptStore {
        &self.receipts
    }

    pub fn resolve(&self, profile: &str, components: Option<&[String]>) -> Result<ResolvedSpec> {
        self.resolver
            .resolve(profile, components)
            .map_err(|e| install_error::operation_failed("resolve", e))
    }

    pub fn plan(&self, profile: &str, components: Option<&[String]>, force: bool) -> Result<InstallPlan> {
        let spec = self.resolve(profile, components)?;
        self.plan_resolved(&spec, force)
    }

    fn plan_resolved(&self, spec: &ResolvedSpec, force: bool) -> Result<InstallPlan> {
        Planner::new(&self.config.target_dir, &self.receipts)
            .with_force(force)
            .plan(spec)
            .map_err(|e| install_error::operation_failed("plan", e))
    }

    /// Remove installed components
    pub fn uninstall(&self, component_ids: &[String]) -> Result<Vec<String>> {
        self.installer()
            .uninstall(component_ids)
            .map_err(|e| install_error::operation_failed("uninstall", e))
    }

    /// Run the doctor over the given components, or everything installed
    pub fn diagnose(
        &self,
        components: Option<&[String]>,
        options: DiagnoseOptions,
    ) -> Result<Vec<Diagnostic>> {
        self.doctor(options.orphans)
            .diagnose(components, options)
            .map_err(|e| install_error::operation_failed("diagnose", e))
    }

    pub fn repair(
        &self,
        diagnostics: &[Diagnostic],
        dry_run: bool,
    ) -> Result<BTreeMap<String, bool>> {
        self.doctor(false)
            .repair(diagnostics, dry_run)
            .map_err(|e| install_error::operation_failed("repair", e))
    }

    fn doctor(&self, with_declared: bool) -> Doctor<'_> {
        let declared = if with_declared {
            self.declared_paths()
        } else {
            BTreeSet::new()
        };
        Doctor::new(&self.config.target_dir, &self.receipts)
            .with_declared_paths(declared)
            .with_config_dirs(self.config.config_dirs.clone())
    }

    /// Destinations of every component in the namespace
    ///
    /// An unloadable manifest declares nothing; the doctor still runs.
    fn declared_paths(&self) -> BTreeSet<String> {
        match self.resolver.namespace() {
            Ok(namespace) => planner::declared_paths(
                namespace.components.values(),
                &self.resolver.config().templates_dir,
            ),
            Err(e) => {
                log::warn!("Orphan check without manifest declarations: {e}");
                BTreeSet::new()
            }
        }
    }
}
