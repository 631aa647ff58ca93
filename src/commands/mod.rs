//! Command implementations for the confstrap CLI
//!
//! Each command is a thin wrapper: it reads its arguments, calls one
//! [`Engine`] operation and renders the result.

pub mod doctor;
pub mod install;
pub mod list;
pub mod plan;
pub mod uninstall;

use confstrap::error::Result;
use confstrap::operations::Engine;

use crate::cli::{Cli, Commands};

/// Open the engine for the global flags and run the selected command
pub fn run(cli: Cli) -> Result<()> {
    let engine = Engine::open(cli.engine_config()?)?;

    match cli.command {
        Commands::Plan(ref args) => plan::run(&engine, &cli, args),
        Commands::Install(ref args) => install::run(&engine, &cli, args),
        Commands::Doctor(ref args) => doctor::run(&engine, &cli, args),
        Commands::List(ref args) => list::run(&engine, args),
        Commands::Uninstall(ref args) => uninstall::run(&engine, &cli, args),
    }
}

/// `None` when no components were named, so the profile is used
pub(crate) fn selected(components: &[String]) -> Option<&[String]> {
    (!components.is_empty()).then_some(components)
}
