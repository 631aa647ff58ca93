//! Doctor command implementation

use console::Style;

use confstrap::doctor::DiagnoseOptions;
use confstrap::domain::{Diagnostic, Severity};
use confstrap::error::{Result, receipt as receipt_error};
use confstrap::operations::Engine;

use crate::cli::{Cli, DoctorArgs};
use crate::commands::selected;

/// Run doctor command
///
/// Fails when an error finding is left open, or when a repairable finding
/// could not be repaired.
pub fn run(engine: &Engine, cli: &Cli, args: &DoctorArgs) -> Result<()> {
    let options = DiagnoseOptions {
        drift: !args.no_drift,
        missing: !args.no_missing,
        orphans: args.orphans,
    };
    let diagnostics = engine.diagnose(selected(&args.components), options)?;

    if diagnostics.is_empty() {
        println!("{} no problems found", Style::new().green().bold().apply_to("✓"));
        return Ok(());
    }

    println!("Found {} problem(s):", diagnostics.len());
    for diagnostic in &diagnostics {
        print_diagnostic(diagnostic);
    }

    if !args.repair {
        let open = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        return finish(open);
    }

    let results = engine.repair(&diagnostics, cli.dry_run)?;
    let repaired = results.values().filter(|ok| **ok).count();
    let verb = if cli.dry_run { "would repair" } else { "repaired" };
    println!();
    for (key, ok) in &results {
        let mark = if *ok {
            Style::new().green().apply_to("✓")
        } else {
            Style::new().red().apply_to("✗")
        };
        println!("  {mark} {key}");
    }
    println!("{verb} {repaired} of {} finding(s)", results.len());

    let open = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error || d.repairable)
        .filter(|d| !results.get(&d.key()).copied().unwrap_or(false))
        .count();
    finish(open)
}

fn finish(open: usize) -> Result<()> {
    if open == 0 {
        Ok(())
    } else {
        Err(receipt_error::unresolved(open))
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let label = match diagnostic.severity {
        Severity::Error => Style::new().red().bold(),
        Severity::Warning => Style::new().yellow().bold(),
        Severity::Info => Style::new().cyan(),
    }
    .apply_to(diagnostic.severity);

    let repairable = if diagnostic.repairable { " [repairable]" } else { "" };
    println!(
        "  {label:<7} {}: {}{}",
        diagnostic.component, diagnostic.message, repairable
    );
}
