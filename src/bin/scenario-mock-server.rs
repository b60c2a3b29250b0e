//! Scenario mock server binary.
//!
//! Serves the scenarios of a JSON scenario file.

use std::process::ExitCode;

use clap::Parser;
use scenario_mock_server::cli::{Cli, Command};
use scenario_mock_server::output::scenario_table;
use scenario_mock_server::{MockServer, ScenarioFile};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> scenario_mock_server::Result<()> {
    match &cli.command {
        Command::Serve { config, .. } => {
            let (scenarios, options) = ScenarioFile::from_path(config)?.into_parts()?;
            let options = cli.command.apply_overrides(options);
            tracing::info!(
                scenarios = scenarios.len(),
                initial = %scenarios.initial().id,
                cookie_mode = options.cookie_mode,
                "loaded scenario file"
            );
            MockServer::run(scenarios, options).await
        }
        Command::List { config, json } => {
            let (scenarios, _) = ScenarioFile::from_path(config)?.into_parts()?;
            if *json {
                let summaries = scenarios.summaries(&scenarios.initial().id);
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                println!("{}", scenario_table(&scenarios));
            }
            Ok(())
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&ScenarioFile::schema())?);
            Ok(())
        }
    }
}
