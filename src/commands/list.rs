//! List command implementation
//!
//! Lists profiles, components and installed components.

use console::Style;

use confstrap::error::Result;
use confstrap::operations::Engine;

use crate::cli::ListArgs;

/// Run list command
pub fn run(engine: &Engine, args: &ListArgs) -> Result<()> {
    let all = args.show_all();

    if all || args.profiles {
        list_profiles(engine)?;
    }
    if all || args.components {
        list_components(engine)?;
    }
    if all || args.installed {
        list_installed(engine)?;
    }
    Ok(())
}

fn heading(text: &str) {
    println!("{}", Style::new().bold().apply_to(text));
}

fn list_profiles(engine: &Engine) -> Result<()> {
    let profiles = engine.list_profiles()?;
    heading(&format!("Profiles ({}):", profiles.len()));
    for profile in &profiles {
        println!(
            "  {} [{}]",
            Style::new().bold().yellow().apply_to(&profile.name),
            profile.components.join(", ")
        );
        if let Some(description) = &profile.description {
            println!("    {description}");
        }
    }
    println!();
    Ok(())
}

fn list_components(engine: &Engine) -> Result<()> {
    let components = engine.list_components()?;
    heading(&format!("Components ({}):", components.len()));
    for component in &components {
        let origin = component
            .plugin_id()
            .map(|id| format!(" (plugin {id})"))
            .unwrap_or_default();
        println!(
            "  {}{} priority {}",
            Style::new().bold().yellow().apply_to(&component.id),
            origin,
            component.effective_priority()
        );
        if !component.dependencies.is_empty() {
            println!("    depends on: {}", component.dependencies.join(", "));
        }
        if let Some(description) = &component.description {
            println!("    {description}");
        }
    }
    println!();
    Ok(())
}

fn list_installed(engine: &Engine) -> Result<()> {
    let receipts = engine.list_installed()?;
    if receipts.is_empty() {
        println!("No components installed.");
        return Ok(());
    }

    heading(&format!("Installed ({}):", receipts.len()));
    for receipt in &receipts {
        println!(
            "  {} {} file(s), installed {}",
            Style::new().bold().yellow().apply_to(&receipt.component_id),
            receipt.files.len(),
            receipt.installed_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
