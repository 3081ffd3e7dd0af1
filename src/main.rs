// Shroud - De-identification Engine for Structured Research Records
// Copyright (c) 2025 Shroud Contributors
// Licensed under the MIT License

use clap::Parser;
use shroud::cli::{Cli, Commands};
use shroud::config::LoggingConfig;
use shroud::domain::ShroudError;
use shroud::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console-only logging for the CLI; file logging is opted into via the
    // configuration once a command loads it.
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    if let Err(e) = init_logging(log_level, &LoggingConfig::default()) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(5);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Shroud de-identification engine"
    );

    let result = match &cli.command {
        Commands::Run(args) => args.execute(&cli.config).await,
        Commands::Validate(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Audit(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            process::exit(exit_code_for(&e));
        }
    }
}

/// Map fatal error classes to distinct exit codes: configuration failures
/// exit 2, crypto failures exit 3, everything else 1.
fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ShroudError>() {
        Some(ShroudError::Configuration(_)) => 2,
        Some(ShroudError::Crypto(_)) => 3,
        _ => 1,
    }
}
