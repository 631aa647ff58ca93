//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - plan: Plan command arguments
//! - install: Install command arguments
//! - doctor: Doctor command arguments
//! - list: List command arguments
//! - uninstall: Uninstall command arguments

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::builder::{Styles, styling::AnsiColor};
use clap::{ArgAction, Parser, Subcommand};

use confstrap::config::EngineConfig;
use confstrap::error::{ConfstrapError, Result};

pub mod doctor;
pub mod install;
pub mod list;
pub mod plan;
pub mod uninstall;

pub use doctor::DoctorArgs;
pub use install::InstallArgs;
pub use list::ListArgs;
pub use plan::{PlanArgs, PlanFormat};
pub use uninstall::UninstallArgs;

/// confstrap - profile-driven configuration installer
#[derive(Parser, Debug)]
#[command(
    name = "confstrap",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install configuration profiles with receipts, drift detection and rollback",
    long_about = "confstrap resolves a profile of components from a manifest, plans the file \
                  operations against a target directory and installs them transactionally, \
                  recording a receipt per component.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  confstrap plan --profile dev            \x1b[90m# Show what would change\x1b[0m\n   \
                  confstrap install --profile dev         \x1b[90m# Install a profile\x1b[0m\n   \
                  confstrap doctor --repair               \x1b[90m# Check and repair installed files\x1b[0m\n   \
                  confstrap list --installed              \x1b[90m# List installed components\x1b[0m\n   \
                  confstrap uninstall --components hooks  \x1b[90m# Remove a component\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Profile to resolve
    #[arg(long, short = 'p', global = true, default_value = "default")]
    pub profile: String,

    /// Show what would happen without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Rewrite every file, even unchanged ones
    #[arg(long, global = true)]
    pub force: bool,

    /// Directory to install into (defaults to current directory)
    #[arg(long, short = 't', global = true, env = "CONFSTRAP_TARGET_DIR")]
    pub target_dir: Option<PathBuf>,

    /// Manifest file (defaults to <target>/confstrap.yaml)
    #[arg(long, short = 'm', global = true, env = "CONFSTRAP_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Plugin directory (defaults to <manifest dir>/plugins)
    #[arg(long, global = true)]
    pub plugins_dir: Option<PathBuf>,

    /// Source directory of built-in components (defaults to <manifest dir>/templates)
    #[arg(long, global = true)]
    pub templates_dir: Option<PathBuf>,

    /// Template variable, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", global = true, value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the install plan for a profile
    Plan(PlanArgs),

    /// Install a profile or selected components
    Install(InstallArgs),

    /// Check installed files against their receipts
    Doctor(DoctorArgs),

    /// List profiles, components or installed components
    List(ListArgs),

    /// Remove installed components
    Uninstall(UninstallArgs),
}

impl Cli {
    /// Engine configuration from the global flags
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let target_dir = match &self.target_dir {
            Some(path) => path.clone(),
            None => std::env::current_dir().map_err(|e| ConfstrapError::IoError {
                message: format!("Failed to get current directory: {e}"),
            })?,
        };

        let mut config = EngineConfig::new(target_dir)
            .with_variables(self.vars.iter().cloned().collect::<BTreeMap<_, _>>());
        if let Some(manifest) = &self.manifest {
            config = config.with_manifest(manifest);
        }
        if let Some(plugins_dir) = &self.plugins_dir {
            config = config.with_plugins_dir(plugins_dir);
        }
        if let Some(templates_dir) = &self.templates_dir {
            config = config.with_templates_dir(templates_dir);
        }
        Ok(config)
    }
}

fn parse_var(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
