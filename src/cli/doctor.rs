use clap::Parser;

/// Arguments for the doctor command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Check every installed component:\n    confstrap doctor\n\n\
                  Also look for untracked files:\n    confstrap doctor --orphans\n\n\
                  Restore missing and modified files:\n    confstrap doctor --repair")]
pub struct DoctorArgs {
    /// Repair what can be repaired after diagnosing
    #[arg(long)]
    pub repair: bool,

    /// Report files in configuration directories that nothing tracks
    #[arg(long)]
    pub orphans: bool,

    /// Skip the content drift check
    #[arg(long)]
    pub no_drift: bool,

    /// Skip the missing file check
    #[arg(long)]
    pub no_missing: bool,

    /// Only check these components
    #[arg(long, value_name = "ID", num_args = 1..)]
    pub components: Vec<String>,
}
