//! Progress bar display for installations

use indicatif::{ProgressBar, ProgressStyle};

use confstrap::installer::InstallObserver;

/// Progress display for installations, one tick per component
pub struct ProgressDisplay {
    component_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a progress display; its length is set once the plan is known
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let component_pb = ProgressBar::new(0);
        component_pb.set_style(style);
        Self { component_pb }
    }

    /// Finish the bar
    pub fn finish(&self) {
        self.component_pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.component_pb.abandon();
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallObserver for ProgressDisplay {
    fn plan_started(&self, components: usize) {
        self.component_pb.set_length(components as u64);
    }

    fn component_started(&self, component: &str, actionable: usize) {
        self.component_pb
            .set_message(format!("{component} ({actionable} file(s))"));
    }

    fn component_finished(&self, _component: &str) {
        self.component_pb.inc(1);
    }

    fn component_skipped(&self, component: &str, reason: &str) {
        self.component_pb.set_message(format!("{component}: {reason}"));
        self.component_pb.inc(1);
    }

    fn rolled_back(&self, components: &[String]) {
        if !components.is_empty() {
            self.component_pb
                .set_message(format!("rolled back {}", components.join(", ")));
        }
    }
}
