// src/main.rs

use std::process::ExitCode;

use devloop::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("devloop: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "devloop stopped");
            eprintln!("devloop error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
