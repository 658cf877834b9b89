use anyhow::Result;
use clap::Parser;
use is_terminal::IsTerminal;
use log::info;
use once_cell::sync::OnceCell;

mod api;
mod cli;
mod config;
mod report;
mod tui;

use api::{ReportBackend, ReportClient};
use cli::Cli;
use tui::apps::{ProjectSelectApp, ReportEditorApp};
use tui::{AppTarget, EditorParams, Runtime, RuntimeExit};

// Global Config instance
static CONFIG: OnceCell<config::Config> = OnceCell::new();

/// Get a reference to the global Config
pub fn global_config() -> &'static config::Config {
    CONFIG.get().expect("Config not initialized")
}

// Global ReportClient instance
static CLIENT: OnceCell<ReportClient> = OnceCell::new();

/// Get a reference to the global ReportClient
pub fn report_client() -> &'static ReportClient {
    CLIENT.get().expect("ReportClient not initialized")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run); stderr belongs to
    // the terminal UI.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("investor-report-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load()?;
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    if cli.save_config {
        config.save()?;
    }

    let client = ReportClient::new(config.api.base_url.clone());
    CONFIG.set(config).expect("Config already initialized");
    let _ = CLIENT.set(client);

    if !std::io::stdout().is_terminal() {
        anyhow::bail!("investor-report-cli needs an interactive terminal");
    }

    info!("Starting investor-report-cli against {}", report_client().base_url());

    // Jump straight into the editor when a project was named and it has an
    // active report; otherwise fall back to the project list.
    let mut target = AppTarget::ProjectSelect;
    if let Some(project) = cli.project {
        match report_client().active_report(&project).await? {
            Some(report) => {
                target = AppTarget::ReportEditor(EditorParams { project, report });
            }
            None => {
                eprintln!("No active report for \"{project}\"; opening the project list.");
            }
        }
    }

    let mut terminal = tui::init_terminal()?;
    let result = run_apps(&mut terminal, target).await;
    tui::restore_terminal(&mut terminal)?;
    result
}

async fn run_apps(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    mut target: AppTarget,
) -> Result<()> {
    loop {
        let exit = match target {
            AppTarget::ProjectSelect => {
                Runtime::<ProjectSelectApp>::new(()).run(terminal).await?
            }
            AppTarget::ReportEditor(params) => {
                Runtime::<ReportEditorApp>::new(params).run(terminal).await?
            }
        };
        match exit {
            RuntimeExit::Quit => break,
            RuntimeExit::Switch(next) => target = next,
        }
    }
    Ok(())
}
