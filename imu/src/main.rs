use clap::Parser;
use softimu::cli::Cli;
use softimu::{session, Shutdown};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Exits with a usage message and status 2 on bad arguments.
    let cli = Cli::parse();

    let shutdown = match Shutdown::install() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            error!("{}", softimu::SessionError::Signals(e));
            return ExitCode::FAILURE;
        }
    };

    match session::run(&cli.session_config(), shutdown) {
        Ok(_) => {
            info!("Exiting.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
