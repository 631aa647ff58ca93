//! Install progress hooks

/// Receives lifecycle events while a plan is installed
///
/// Every method defaults to doing nothing, so implementations only override
/// what they display.
pub trait InstallObserver {
    /// Called once before the first component, with the plan's component count
    fn plan_started(&self, _components: usize) {}

    fn component_started(&self, _component: &str, _actionable: usize) {}

    fn component_finished(&self, _component: &str) {}

    fn component_skipped(&self, _component: &str, _reason: &str) {}

    /// Components undone after a failure, in rollback order
    fn rolled_back(&self, _components: &[String]) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl InstallObserver for NoopObserver {}
