mod cli;
mod credentials_env;
mod finalize;
mod logging;
mod metadata;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr-only if
    // the log directory can't be created (e.g. read-only home).
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("rfetch error: {:#}", err);
        std::process::exit(1);
    }
}
