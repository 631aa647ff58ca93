use clap::Parser;

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Remove one component:\n    confstrap uninstall --components hooks\n\n\
                  Remove several:\n    confstrap uninstall --components hooks agents")]
pub struct UninstallArgs {
    /// Components to remove
    #[arg(long, value_name = "ID", num_args = 1.., required = true)]
    pub components: Vec<String>,
}
