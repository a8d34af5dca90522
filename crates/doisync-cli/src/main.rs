//! doisync CLI - Main entry point

use clap::Parser;
use doisync_cli::api::ApiClient;
use doisync_cli::{commands, Cli, Commands};
use doisync_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Warn };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("doisync-cli")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> doisync_cli::Result<()> {
    let client = ApiClient::new(cli.server_url.as_str())?;

    match &cli.command {
        Commands::Status { doi, format } => commands::status::run(&client, doi, *format).await,
        Commands::ListFailed { format } => commands::list_failed::run(&client, *format).await,
        Commands::Export { doi, output } => {
            commands::export::run(&client, doi, output.as_deref()).await
        },
        Commands::Rerun { doi } => commands::rerun::run(&client, doi).await,
    }
}
