//! `azvm` command-line front end.
//!
//! Loads configuration, connects to Azure Resource Manager through
//! `azvm-azure` and dispatches one subcommand.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod service;

use cli::Cli;
use config::AzvmConfig;
use error::CliResult;
use service::AzvmService;

/// Run one invocation and return the text to print on stdout.
///
/// Config and local inputs are checked before authenticating.
pub async fn run(cli: Cli) -> CliResult<String> {
    let config = AzvmConfig::load(cli.config.as_deref())?;
    let request = commands::prepare(&cli.command)?;
    let service = AzvmService::connect(&config).await?;
    commands::execute(&service, &request, cli.output).await
}
