//! Install operation

use std::collections::BTreeMap;

use super::Engine;
use crate::domain::InstallPlan;
use crate::error::{Result, conflict as conflict_error, install as install_error};
use crate::installer::{InstallObserver, Installer, NoopObserver};

/// What to install and how
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub profile: String,
    /// Explicit components; the profile is then only a label
    pub components: Option<Vec<String>>,
    pub dry_run: bool,
    pub force: bool,
}

impl InstallOptions {
    pub fn profile(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            components: None,
            dry_run: false,
            force: false,
        }
    }
}

/// The executed plan and per-component results
#[derive(Debug)]
pub struct InstallOutcome {
    pub plan: InstallPlan,
    pub results: BTreeMap<String, bool>,
}

impl Engine {
    pub(super) fn installer(&self) -> Installer<'_> {
        Installer::new(&self.config.target_dir, &self.receipts, self.renderer.as_ref())
            .with_variables(self.config.variables.clone())
    }

    /// Resolve, plan and install in one go
    ///
    /// A plan writing one destination twice is refused before anything is
    /// installed.
    pub fn install(&self, options: &InstallOptions) -> Result<InstallOutcome> {
        self.install_with_observer(options, &NoopObserver)
    }

    pub fn install_with_observer(
        &self,
        options: &InstallOptions,
        observer: &dyn InstallObserver,
    ) -> Result<InstallOutcome> {
        let spec = self.resolve(&options.profile, options.components.as_deref())?;
        let plan = self.plan_resolved(&spec, options.force)?;
        if let Some((path, first, second)) = plan.first_conflict() {
            return Err(install_error::operation_failed(
                "plan",
                conflict_error::file(path, first, second),
            ));
        }

        let results = self
            .installer()
            .with_observer(observer)
            .install_plan(&plan, options.dry_run, options.force)
            .map_err(|e| install_error::operation_failed("install", e))?;

        Ok(InstallOutcome { plan, results })
    }
}
