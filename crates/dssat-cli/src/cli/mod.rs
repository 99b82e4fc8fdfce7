mod commands;
mod helpers;

use clap::Parser;
use dssat_core::domain::DssatError;

pub async fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args).await {
        Ok(code) => code,
        Err(error) => {
            let bridge_error = error.as_dssat_error();
            eprintln!("{}", bridge_error.diagnostic_line());
            bridge_error.exit_code()
        }
    }
}

async fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command).await,
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "dssat-rs", about = "DSSAT ensemble bridge")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Assemble control and weather files for every ensemble member
    Prepare(commands::ManifestArgs),
    /// Drive the simulator across the prepared ensemble
    Run(commands::ManifestArgs),
    /// Build and label the yield table from a completed run
    Report(commands::ManifestArgs),
    /// Full sequential chain: prepare, run, report
    Simulate(commands::ManifestArgs),
}

async fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Prepare(args) => commands::run_prepare_command(args).await,
        CliCommand::Run(args) => commands::run_run_command(args),
        CliCommand::Report(args) => commands::run_report_command(args).await,
        CliCommand::Simulate(args) => commands::run_simulate_command(args).await,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Bridge(DssatError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<DssatError> for CliError {
    fn from(error: DssatError) -> Self {
        Self::Bridge(error)
    }
}

impl CliError {
    fn as_dssat_error(&self) -> DssatError {
        match self {
            Self::Usage(message) => DssatError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Bridge(error) => error.clone(),
            Self::Internal(error) => DssatError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
