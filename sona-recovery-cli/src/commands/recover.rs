use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use sona_recovery_models::{RecoveryReport, ReconfigureOutcome};
use sona_recovery_orchestrations::context::RecoveryContext;
use sona_recovery_orchestrations::controller_api::HttpControllerApi;
use sona_recovery_orchestrations::k8s_client::KubePlatform;
use sona_recovery_orchestrations::{recover_cluster_orchestration, RecoveryError};
use tokio_util::sync::CancellationToken;

use crate::cli::Args;
use crate::config::RecoveryConfig;

pub async fn run_recover(args: Args) -> Result<ExitCode> {
    let config = RecoveryConfig::load(&args)?;

    tracing::info!("SONA Recovery CLI");
    tracing::debug!(?config, "Loaded configuration");

    let platform = KubePlatform::try_default()
        .await
        .context("Failed to connect to Kubernetes")?;
    let api = HttpControllerApi::new(config.api_port, config.credentials.clone(), config.http_timeout)?;

    let cancel = CancellationToken::new();
    spawn_shutdown_handler(cancel.clone());

    let ctx = RecoveryContext::new(Arc::new(platform), Arc::new(api)).with_cancellation(cancel);
    tracing::info!(run_id = %ctx.run_id(), "Starting recovery of {} replica(s) in namespace {}",
                   config.replicas.len(), config.namespace);

    let result = recover_cluster_orchestration(&ctx, config.to_input()).await;

    match &result {
        Ok(report) => print_report(report, &args.output)?,
        Err(e) => print_failure(e),
    }

    Ok(ExitCode::from(exit_status(&result)))
}

/// 0 on completion, whatever the reconfiguration outcomes; 1 on any abort
fn exit_status(result: &Result<RecoveryReport, RecoveryError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Trip `cancel` on Ctrl-C or SIGTERM; the run stops at the next step boundary
fn spawn_shutdown_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to register SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }

        tracing::warn!("Shutdown signal received, cancelling recovery");
        cancel.cancel();
    });
}

fn print_report(report: &RecoveryReport, output: &str) -> Result<()> {
    if output == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Recovery: {}", report.run_id);
    println!("{}", "=".repeat(60));
    println!();
    println!("Status:");
    println!("  Phase:              {}", report.phase);
    println!("  Elapsed:            {}s", report.elapsed_seconds());
    println!("  Snapshot:           {} bytes", report.snapshot_bytes);
    println!("  Deleted Pods:       {}", report.deleted_pods.join(", "));
    println!();
    println!("{:<20} {:<18} {:<18}", "REPLICA", "ADDRESS BEFORE", "ADDRESS AFTER");
    println!("{}", "-".repeat(56));
    for replica in &report.replicas {
        println!("{:<20} {:<18} {:<18}",
                 replica.name, replica.address_before, replica.address_after);
    }
    println!();
    println!("{:<18} {:<18} {}", "STEP", "ADDRESS", "RESULT");
    println!("{}", "-".repeat(56));
    for outcome in &report.reconfiguration {
        println!("{:<18} {:<18} {}", outcome.step, outcome.address, describe_outcome(outcome));
    }
    println!();

    let failed = report.failed_reconfiguration_steps();
    if failed.is_empty() {
        println!("✓ Recovery complete");
    } else {
        println!("⚠ Recovery complete, {} reconfiguration call(s) failed: {}",
                 failed.len(), failed.join(", "));
    }

    Ok(())
}

fn print_failure(error: &RecoveryError) {
    eprintln!("✗ Recovery failed: {}", error);
    if error.is_backup_invalid() {
        eprintln!("  No pods were deleted.");
    }
}

fn describe_outcome(outcome: &ReconfigureOutcome) -> String {
    match (&outcome.error, outcome.status) {
        (Some(error), _) => format!("failed ({})", error),
        (None, Some(status)) if outcome.is_success() => format!("ok (HTTP {})", status),
        (None, Some(status)) => format!("failed (HTTP {})", status),
        (None, None) => "no response".to_string(),
    }
}
