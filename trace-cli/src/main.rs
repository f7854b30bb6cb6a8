use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use trace_cli::cli::Cli;
use trace_cli::{app, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_logging(logging::DEFAULT_LEVEL);
    if cli.quiet {
        let _ = logging::set_console_enabled(false);
    }

    match app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
