use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;

use cli::Args;

/// Initialize tracing with dual output:
/// 1. Console output (stderr) - keeps stdout free for the report
/// 2. File output (~/.sona-recovery/recovery.log) - persists across runs
fn initialize_tracing() -> Result<WorkerGuard> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,\
         sona_recovery=debug,\
         sona_recovery_orchestrations=debug,\
         kube=warn"
            .into()
    });

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let log_dir = PathBuf::from(home).join(".sona-recovery");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "recovery.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    // -h / -? / --help print usage and exit here
    let args = Args::parse();

    // Dropping the guard flushes and stops file logging
    let _guard = match initialize_tracing() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("⚠ File logging disabled: {:#}", e);
            None
        }
    };

    match commands::recover::run_recover(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("✗ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
