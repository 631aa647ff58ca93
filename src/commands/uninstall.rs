//! Uninstall command implementation

use console::Style;

use confstrap::error::{Result, install as install_error};
use confstrap::operations::Engine;

use crate::cli::{Cli, UninstallArgs};

/// Run uninstall command
pub fn run(engine: &Engine, cli: &Cli, args: &UninstallArgs) -> Result<()> {
    if cli.dry_run {
        for id in &args.components {
            let receipt = engine
                .receipts()
                .read(id)?
                .ok_or_else(|| install_error::not_installed(id))?;
            println!("Would remove {} ({} file(s))", id, receipt.files.len());
            for path in receipt.tracked_paths() {
                println!("  {path}");
            }
        }
        return Ok(());
    }

    for id in engine.uninstall(&args.components)? {
        println!("{} uninstalled {id}", Style::new().green().bold().apply_to("✓"));
    }
    Ok(())
}
