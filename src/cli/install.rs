use clap::Parser;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install the default profile:\n    confstrap install\n\n\
                   Install a named profile:\n    confstrap install --profile dev\n\n\
                   Install single components with their dependencies:\n    \
                   confstrap install --components hooks agents\n\n\
                   Preview without writing:\n    confstrap install --dry-run")]
pub struct InstallArgs {
    /// Install these components (and their dependencies) instead of the profile
    #[arg(long, value_name = "ID", num_args = 1..)]
    pub components: Vec<String>,
}
