use clap::{Parser, ValueEnum};

/// Output format of the plan command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PlanFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show the plan of the default profile:\n    confstrap plan\n\n\
                  Machine-readable plan:\n    confstrap plan --profile dev --format json")]
pub struct PlanArgs {
    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = PlanFormat::Text)]
    pub format: PlanFormat,

    /// Plan these components (and their dependencies) instead of the profile
    #[arg(long, value_name = "ID", num_args = 1..)]
    pub components: Vec<String>,
}
