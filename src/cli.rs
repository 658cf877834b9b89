use clap::Parser;

#[derive(Parser)]
#[command(name = "investor-report-cli")]
#[command(about = "A terminal client for the investor report builder service")]
pub struct Cli {
    /// Override the backend API base URL for this run
    #[arg(long)]
    pub api_url: Option<String>,

    /// Persist command-line overrides to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Open the report editor for this project's active report directly
    #[arg(long)]
    pub project: Option<String>,
}
