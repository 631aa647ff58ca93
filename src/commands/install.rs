//! Install command implementation

use console::Style;

use confstrap::error::Result;
use confstrap::operations::{Engine, InstallOptions};

use crate::cli::{Cli, InstallArgs};
use crate::commands::selected;
use crate::progress::ProgressDisplay;

/// Run install command
pub fn run(engine: &Engine, cli: &Cli, args: &InstallArgs) -> Result<()> {
    let options = InstallOptions {
        profile: cli.profile.clone(),
        components: selected(&args.components).map(<[String]>::to_vec),
        dry_run: cli.dry_run,
        force: cli.force,
    };

    if options.dry_run {
        let plan = engine.plan(&options.profile, options.components.as_deref(), options.force)?;
        print!("{}", super::plan::render(&plan, crate::cli::PlanFormat::Text)?);
        println!(
            "\n{} nothing was written",
            Style::new().bold().apply_to("Dry run:")
        );
        return Ok(());
    }

    let progress = ProgressDisplay::new();

    let outcome = match engine.install_with_observer(&options, &progress) {
        Ok(outcome) => {
            progress.finish();
            outcome
        }
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };

    let changed = outcome.plan.actionable_files();
    if changed == 0 {
        println!(
            "{} profile '{}' is up to date",
            Style::new().green().bold().apply_to("✓"),
            outcome.plan.profile()
        );
    } else {
        println!(
            "{} installed {} component(s), {} file(s) written",
            Style::new().green().bold().apply_to("✓"),
            outcome.results.values().filter(|ok| **ok).count(),
            changed
        );
    }
    Ok(())
}
