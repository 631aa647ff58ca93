//! Plan command implementation

use console::Style;

use confstrap::domain::{ActionKind, InstallPlan};
use confstrap::error::{ConfstrapError, Result};
use confstrap::operations::Engine;

use crate::cli::{Cli, PlanArgs, PlanFormat};
use crate::commands::selected;

/// Run plan command
pub fn run(engine: &Engine, cli: &Cli, args: &PlanArgs) -> Result<()> {
    let plan = engine.plan(&cli.profile, selected(&args.components), cli.force)?;
    print!("{}", render(&plan, args.format)?);
    Ok(())
}

/// Render a plan in the requested format
pub fn render(plan: &InstallPlan, format: PlanFormat) -> Result<String> {
    match format {
        PlanFormat::Text => Ok(render_text(plan)),
        PlanFormat::Json => serde_json::to_string_pretty(&plan.to_value())
            .map(|mut text| {
                text.push('\n');
                text
            })
            .map_err(ConfstrapError::from),
        PlanFormat::Yaml => serde_yaml::to_string(&plan.to_value()).map_err(|e| ConfstrapError::IoError {
            message: format!("Failed to render plan as YAML: {e}"),
        }),
    }
}

fn render_text(plan: &InstallPlan) -> String {
    let bold = Style::new().bold();
    let mut out = format!(
        "{} {} ({} file(s), {} to change, {} byte(s))\n",
        bold.apply_to("Profile:"),
        plan.profile(),
        plan.total_files(),
        plan.actionable_files(),
        plan.estimated_size()
    );

    for component in plan.components() {
        out.push_str(&format!(
            "\n  {}",
            Style::new().bold().yellow().apply_to(component.component_id())
        ));
        if let Some(plugin) = component.plugin_id() {
            out.push_str(&format!(" (plugin {plugin})"));
        }
        out.push('\n');

        if component.actions().is_empty() {
            out.push_str("    no files\n");
        }
        for action in component.actions() {
            let kind_style = match action.kind() {
                ActionKind::Skip => Style::new().dim(),
                ActionKind::Merge => Style::new().magenta(),
                ActionKind::Template => Style::new().cyan(),
                ActionKind::Copy => Style::new().green(),
            };
            out.push_str(&format!(
                "    {} {} -> {} ({})\n",
                kind_style.apply_to(format!("{:<8}", action.kind().to_string())),
                action.source_path(),
                action.target_path(),
                action.reason()
            ));
        }
    }

    if plan.has_conflicts() {
        out.push_str(&format!(
            "\n{}\n",
            Style::new()
                .bold()
                .red()
                .apply_to("Warning: several components write the same destination")
        ));
    }
    out
}
