use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List everything:\n    confstrap list\n\n\
                  Only installed components:\n    confstrap list --installed")]
pub struct ListArgs {
    /// List the profiles defined by the manifest and plugins
    #[arg(long)]
    pub profiles: bool,

    /// List every known component
    #[arg(long)]
    pub components: bool,

    /// List installed components
    #[arg(long)]
    pub installed: bool,
}

impl ListArgs {
    /// Without a selection every section is shown
    pub fn show_all(&self) -> bool {
        !(self.profiles || self.components || self.installed)
    }
}
