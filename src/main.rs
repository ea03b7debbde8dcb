use azure_stack_samples::cli::CliArgs;
use azure_stack_samples::logging;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    if let Err(e) = logging::init(logging::LOG_CONFIG_FILE) {
        eprintln!("Error initializing log4rs: {e}");
    }
    dotenv::dotenv().ok();
    let args = CliArgs::parse();
    log::info!("#Start main() {:?}", args.command);

    match azure_stack_samples::run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{}", e.to_string().red());
            ExitCode::FAILURE
        }
    }
}
