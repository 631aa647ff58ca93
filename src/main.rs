//! confstrap - profile-driven configuration installer
//!
//! Command line entry point. All behavior lives in the library; this binary
//! parses arguments, sets up logging and renders results.

use clap::Parser;

mod cli;
mod commands;
mod progress;

use cli::Cli;

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("CONFSTRAP_LOG")
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = commands::run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
