//! Recover controller cluster orchestration
//!
//! Backs up the node configuration from the first replica, deletes every pod,
//! waits for the replicas to come back and activate, then restores the
//! configuration and re-syncs state and rules against the first replica.
//!
//! The backup gate is the only fail-fast check. Once pods are deleted the run
//! is committed: there is no rollback, and a stuck run is recovered by running
//! the whole orchestration again.

use chrono::Utc;
use futures::future::try_join_all;
use sona_recovery_models::{
    RecoveryReport, ReconfigureOutcome, ReplicaReport, RunPhase, Topology,
};
use uuid::Uuid;

use crate::activities::{
    backup_config, delete_pods, resolve_address, restore_config, set_arp_mode, sync_rules,
    sync_states, wait_for_app, wait_for_pod,
};
use crate::activity_types::{
    BackupConfigInput, DeletePodsInput, ResolveAddressInput, RestoreConfigInput, SetArpModeInput,
    SyncInput, WaitForAppInput, WaitForPodInput,
};
use crate::context::RecoveryContext;
use crate::error::RecoveryError;
use crate::names::orchestrations;
use crate::snapshot::SnapshotStore;
use crate::types::RecoverClusterInput;

/// In-memory state of one run. Dropped when the run ends; nothing is persisted.
struct RecoveryRun {
    topology: Topology,
    phase: RunPhase,
    started_at: chrono::DateTime<Utc>,
    snapshot_bytes: u64,
    addresses_before: Vec<String>,
    deleted_pods: Vec<String>,
    reconfiguration: Vec<ReconfigureOutcome>,
}

impl RecoveryRun {
    fn new(topology: Topology) -> Self {
        Self {
            topology,
            phase: RunPhase::Idle,
            started_at: Utc::now(),
            snapshot_bytes: 0,
            addresses_before: Vec::new(),
            deleted_pods: Vec::new(),
            reconfiguration: Vec::new(),
        }
    }

    fn advance(&mut self, ctx: &RecoveryContext, phase: RunPhase) {
        tracing::info!(
            run_id = %ctx.run_id(),
            from = %self.phase,
            phase = %phase,
            "Recovery phase transition"
        );
        self.phase = phase;
    }

    fn replica_names(&self) -> Vec<String> {
        self.topology
            .replicas()
            .iter()
            .map(|node| node.name.clone())
            .collect()
    }

    fn replica_addresses(&self) -> Result<Vec<String>, RecoveryError> {
        self.topology
            .replicas()
            .iter()
            .map(|node| {
                node.address
                    .clone()
                    .ok_or_else(|| RecoveryError::AddressUnavailable {
                        pod: node.name.clone(),
                    })
            })
            .collect()
    }

    /// Address of the control point used for backup and reconfiguration
    fn control_address(&self) -> Result<String, RecoveryError> {
        let node = self.topology.first_replica();
        node.address
            .clone()
            .ok_or_else(|| RecoveryError::AddressUnavailable {
                pod: node.name.clone(),
            })
    }

    fn into_report(self, run_id: Uuid) -> RecoveryReport {
        let replicas = self
            .topology
            .replicas()
            .iter()
            .zip(self.addresses_before)
            .map(|(node, address_before)| ReplicaReport {
                name: node.name.clone(),
                address_before,
                address_after: node.address.clone().unwrap_or_default(),
            })
            .collect();

        RecoveryReport {
            run_id,
            phase: self.phase,
            started_at: self.started_at,
            finished_at: Utc::now(),
            snapshot_bytes: self.snapshot_bytes,
            deleted_pods: self.deleted_pods,
            replicas,
            reconfiguration: self.reconfiguration,
        }
    }
}

pub async fn recover_cluster_orchestration(
    ctx: &RecoveryContext,
    input: RecoverClusterInput,
) -> Result<RecoveryReport, RecoveryError> {
    ctx.trace_info(format!(
        "Recovering controller cluster: {} + {} replica(s) in namespace {} (orchestration: {})",
        input.cluster_manager,
        input.replicas.len(),
        input.namespace,
        orchestrations::RECOVER_CLUSTER
    ));

    let topology = Topology::new(&input.cluster_manager, &input.replicas)?;
    let mut run = RecoveryRun::new(topology);

    ctx.checkpoint()?;

    // Armed before resolution: every exit path purges the snapshot
    let store = SnapshotStore::new(&input.snapshot_path);
    let guard = store.guard();

    let result = recover_from_backup(ctx, &input, &mut run, &store).await;

    match guard.purge() {
        Ok(true) => ctx.trace_info(format!("Snapshot {} purged", store.path().display())),
        Ok(false) => {}
        Err(e) => ctx.trace_warn(format!(
            "Failed to purge snapshot {}: {}",
            store.path().display(),
            e
        )),
    }

    match result {
        Ok(()) => {
            run.advance(ctx, RunPhase::Done);
            let report = run.into_report(ctx.run_id());

            let failed = report.failed_reconfiguration_steps();
            if failed.is_empty() {
                ctx.trace_info("Cluster recovery complete");
            } else {
                ctx.trace_warn(format!(
                    "Cluster recovery complete, but these calls did not succeed: {}",
                    failed.join(", ")
                ));
            }
            Ok(report)
        }
        Err(e) => {
            ctx.trace_error(format!("Cluster recovery stopped in phase {}: {}", run.phase, e));
            Err(e)
        }
    }
}

async fn recover_from_backup(
    ctx: &RecoveryContext,
    input: &RecoverClusterInput,
    run: &mut RecoveryRun,
    store: &SnapshotStore,
) -> Result<(), RecoveryError> {
    run.advance(ctx, RunPhase::BackingUp);

    // Step 1: Resolve replica addresses (nothing touched yet on failure)
    ctx.trace_info(format!("Step 1: Resolving replica addresses ({})", resolve_address::NAME));
    resolve_replicas(ctx, input, run).await?;
    run.addresses_before = run.replica_addresses()?;

    // Step 2: Back up configuration from the control point
    ctx.trace_info(format!("Step 2: Backing up node configuration ({})", backup_config::NAME));
    backup_config::activity(
        ctx,
        BackupConfigInput {
            address: run.control_address()?,
            snapshot_path: input.snapshot_path.clone(),
        },
    )
    .await?;

    if !store.validate() {
        run.advance(ctx, RunPhase::BackupFailed);
        ctx.trace_error("Backup is missing or empty, aborting before any pod is deleted");
        return Err(RecoveryError::BackupInvalid {
            path: input.snapshot_path.clone(),
        });
    }
    run.snapshot_bytes = store.size();
    run.advance(ctx, RunPhase::BackupOk);

    // Step 3: Delete every pod, cluster manager first
    ctx.checkpoint()?;
    run.advance(ctx, RunPhase::TearingDown);
    ctx.trace_info(format!("Step 3: Deleting controller cluster pods ({})", delete_pods::NAME));
    let deleted = delete_pods::activity(
        ctx,
        DeletePodsInput {
            namespace: input.namespace.clone(),
            pod_names: run
                .topology
                .nodes()
                .iter()
                .map(|node| node.name.clone())
                .collect(),
        },
    )
    .await?;
    run.deleted_pods = deleted.deleted;

    // Step 4: Wait for pods to be recreated and Running
    ctx.checkpoint()?;
    run.advance(ctx, RunPhase::WaitingForPods);
    ctx.trace_info(format!("Step 4: Waiting for pods to be recreated ({})", wait_for_pod::NAME));
    if input.wait_for_cluster_manager {
        let cluster_manager = run.topology.cluster_manager().name.clone();
        wait_for_pod::activity(ctx, wait_for_pod_input(input, cluster_manager)).await?;
    }
    wait_for_replicas(ctx, input, run.replica_names()).await?;

    // Addresses change on recreation; never reuse the ones from before teardown
    ctx.checkpoint()?;
    resolve_replicas(ctx, input, run).await?;

    // Step 5: Wait for applications to activate on every replica
    run.advance(ctx, RunPhase::WaitingForApps);
    ctx.trace_info(format!("Step 5: Waiting for applications to activate ({})", wait_for_app::NAME));
    wait_for_apps(ctx, input, run.replica_addresses()?).await?;

    // Step 6: Restore configuration and reconfigure the control point
    ctx.checkpoint()?;
    let address = run.control_address()?;

    run.advance(ctx, RunPhase::Restoring);
    ctx.trace_info(format!("Step 6: Restoring configuration on {} ({})", address, restore_config::NAME));
    let restored = restore_config::activity(
        ctx,
        RestoreConfigInput {
            address: address.clone(),
            snapshot_path: input.snapshot_path.clone(),
        },
    )
    .await?;
    run.reconfiguration.push(restored);

    run.advance(ctx, RunPhase::Reconfiguring);
    ctx.trace_info(format!("Step 7: Reconfiguring {} (ARP mode {})", address, input.arp_mode));
    run.reconfiguration.push(
        set_arp_mode::activity(
            ctx,
            SetArpModeInput {
                address: address.clone(),
                mode: input.arp_mode,
            },
        )
        .await,
    );
    run.reconfiguration.push(
        sync_states::activity(
            ctx,
            SyncInput {
                address: address.clone(),
            },
        )
        .await,
    );
    run.reconfiguration
        .push(sync_rules::activity(ctx, SyncInput { address }).await);

    Ok(())
}

async fn resolve_replicas(
    ctx: &RecoveryContext,
    input: &RecoverClusterInput,
    run: &mut RecoveryRun,
) -> Result<(), RecoveryError> {
    for node in run.topology.replicas_mut() {
        let resolved = resolve_address::activity(
            ctx,
            ResolveAddressInput {
                namespace: input.namespace.clone(),
                pod_name: node.name.clone(),
            },
        )
        .await?;
        node.address = Some(resolved.address);
    }
    Ok(())
}

fn wait_for_pod_input(input: &RecoverClusterInput, pod_name: String) -> WaitForPodInput {
    WaitForPodInput {
        namespace: input.namespace.clone(),
        pod_name,
        poll_interval_ms: input.poll_interval_ms,
        timeout_seconds: input.pod_timeout_seconds,
    }
}

async fn wait_for_replicas(
    ctx: &RecoveryContext,
    input: &RecoverClusterInput,
    replicas: Vec<String>,
) -> Result<(), RecoveryError> {
    let inputs = replicas
        .into_iter()
        .map(|pod_name| wait_for_pod_input(input, pod_name));

    if input.parallel_waits {
        try_join_all(inputs.map(|wait_input| wait_for_pod::activity(ctx, wait_input))).await?;
    } else {
        for wait_input in inputs {
            wait_for_pod::activity(ctx, wait_input).await?;
        }
    }
    Ok(())
}

async fn wait_for_apps(
    ctx: &RecoveryContext,
    input: &RecoverClusterInput,
    addresses: Vec<String>,
) -> Result<(), RecoveryError> {
    let inputs = addresses.into_iter().map(|address| WaitForAppInput {
        address,
        poll_interval_ms: input.poll_interval_ms,
        timeout_seconds: input.app_timeout_seconds,
    });

    if input.parallel_waits {
        try_join_all(inputs.map(|wait_input| wait_for_app::activity(ctx, wait_input))).await?;
    } else {
        for wait_input in inputs {
            wait_for_app::activity(ctx, wait_input).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller_api::endpoints;
    use crate::test_support::{
        context, entries, journal, standard_input, Failure, FakeControllerApi, FakePlatform,
        Journal,
    };
    use sona_recovery_models::PodStatus;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const BACKUP_BODY: &[u8] = br#"{"nodes":[{"hostname":"compute-00001"}]}"#;

    fn standard_api(log: &Journal) -> FakeControllerApi {
        FakeControllerApi::new(log.clone(), Some(BACKUP_BODY))
            .with_probes("10.0.1.1", &[503, 503, 200])
            .with_probes("10.0.1.2", &[503, 503, 200])
            .with_probes("10.0.1.3", &[503, 503, 200])
    }

    fn is_reconfiguration(entry: &str) -> bool {
        entry.starts_with("POST")
            || entry.contains("/arpmode/")
            || entry.contains("/sync/")
    }

    fn deletions(log: &Journal) -> Vec<String> {
        entries(log)
            .into_iter()
            .filter(|entry| entry.starts_with("delete"))
            .collect()
    }

    #[tokio::test]
    async fn test_full_recovery_of_three_replicas() {
        let dir = tempfile::tempdir().unwrap();
        let input = standard_input(dir.path());
        let log = journal();
        let ctx = context(FakePlatform::standard(log.clone()), Arc::new(standard_api(&log)));

        let report = recover_cluster_orchestration(&ctx, input.clone()).await.unwrap();

        assert_eq!(report.phase, RunPhase::Done);
        assert_eq!(report.run_id, ctx.run_id());
        assert_eq!(report.snapshot_bytes, 40);
        assert_eq!(
            report.deleted_pods,
            vec!["sona-atomix-1", "sona-onos-1", "sona-onos-2", "sona-onos-3"]
        );
        assert_eq!(report.replicas[0].address_before, "10.0.0.1");
        assert_eq!(report.replicas[0].address_after, "10.0.1.1");

        let steps: Vec<&str> = report
            .reconfiguration
            .iter()
            .map(|outcome| outcome.step.as_str())
            .collect();
        assert_eq!(steps, vec!["restore-config", "set-arp-mode", "sync-states", "sync-rules"]);
        assert!(report.reconfiguration.iter().all(|o| o.is_success() && o.address == "10.0.1.1"));

        // Every probe and listing happened before the first reconfiguration call
        let log = entries(&log);
        let reconfiguration: Vec<&String> = log.iter().filter(|e| is_reconfiguration(e)).collect();
        assert_eq!(
            reconfiguration,
            vec![
                "POST 10.0.1.1/onos/openstacknode/configure",
                "GET 10.0.1.1/onos/openstacknetworking/management/config/arpmode/broadcast",
                "GET 10.0.1.1/onos/openstacknetworking/management/sync/states",
                "GET 10.0.1.1/onos/openstacknetworking/management/sync/rules",
            ]
        );
        assert!(log[log.len() - 4..].iter().all(|e| is_reconfiguration(e)));

        for address in ["10.0.1.1", "10.0.1.2", "10.0.1.3"] {
            let probe = format!("GET {}{}", address, endpoints::FLOATING_IPS);
            assert_eq!(log.iter().filter(|e| **e == probe).count(), 3);
        }

        assert!(!input.snapshot_path.exists());
    }

    #[tokio::test]
    async fn test_restore_posts_the_backed_up_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let log = journal();
        let api = Arc::new(standard_api(&log));
        let ctx = context(FakePlatform::standard(log.clone()), api.clone());

        recover_cluster_orchestration(&ctx, standard_input(dir.path()))
            .await
            .unwrap();

        assert_eq!(api.posted(), vec![("10.0.1.1".to_string(), BACKUP_BODY.to_vec())]);
    }

    #[tokio::test]
    async fn test_invalid_backup_fails_fast() {
        for body in [Some(&b""[..]), None] {
            let dir = tempfile::tempdir().unwrap();
            let input = standard_input(dir.path());
            let log = journal();
            let ctx = context(
                FakePlatform::standard(log.clone()),
                Arc::new(FakeControllerApi::new(log.clone(), body)),
            );

            let err = recover_cluster_orchestration(&ctx, input.clone()).await.unwrap_err();

            assert!(err.is_backup_invalid());
            assert!(deletions(&log).is_empty());
            assert!(!entries(&log).iter().any(|e| is_reconfiguration(e)));
            assert!(!input.snapshot_path.exists());
        }
    }

    #[tokio::test]
    async fn test_unresolvable_replica_stops_before_backup() {
        let dir = tempfile::tempdir().unwrap();
        let log = journal();
        let platform = FakePlatform::new(log.clone())
            .with_pod("sona-atomix-1", "10.0.0.100", "10.0.1.100")
            .with_pod("sona-onos-1", "10.0.0.1", "10.0.1.1")
            .with_pod("sona-onos-3", "10.0.0.3", "10.0.1.3");
        let ctx = context(platform, Arc::new(standard_api(&log)));

        let err = recover_cluster_orchestration(&ctx, standard_input(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, RecoveryError::AddressUnavailable { ref pod } if pod == "sona-onos-2"));
        assert!(entries(&log).iter().all(|e| e == "list"));
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_purged_when_resolution_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = standard_input(dir.path());
        std::fs::write(&input.snapshot_path, b"{\"nodes\":[]}").unwrap();

        let log = journal();
        let platform = FakePlatform::new(log.clone())
            .with_pod("sona-atomix-1", "10.0.0.100", "10.0.1.100")
            .with_pod("sona-onos-1", "10.0.0.1", "10.0.1.1");
        let ctx = context(platform, Arc::new(standard_api(&log)));

        let err = recover_cluster_orchestration(&ctx, input.clone()).await.unwrap_err();

        assert!(matches!(err, RecoveryError::AddressUnavailable { .. }));
        assert!(!input.snapshot_path.exists());
    }

    #[tokio::test]
    async fn test_terminating_pods_are_not_mistaken_for_recreated_ones() {
        let dir = tempfile::tempdir().unwrap();
        let log = journal();
        let platform = ["sona-atomix-1", "sona-onos-1", "sona-onos-2", "sona-onos-3"]
            .into_iter()
            .fold(FakePlatform::standard(log.clone()), |platform, name| {
                platform.with_termination(name, 2)
            });
        let ctx = context(platform, Arc::new(standard_api(&log)));

        let report = recover_cluster_orchestration(&ctx, standard_input(dir.path()))
            .await
            .unwrap();

        for (i, replica) in report.replicas.iter().enumerate() {
            assert_eq!(replica.address_before, format!("10.0.0.{}", i + 1));
            assert_eq!(replica.address_after, format!("10.0.1.{}", i + 1));
        }
        // Nothing after teardown talks to an old address
        let log = entries(&log);
        let teardown_end = log.iter().rposition(|e| e.starts_with("delete")).unwrap();
        assert!(log[teardown_end..].iter().all(|e| !e.contains(" 10.0.0.")));
        assert!(report.reconfiguration.iter().all(|o| o.address == "10.0.1.1"));
    }

    #[tokio::test]
    async fn test_pod_deadline_reports_stuck_pod_and_purges_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = standard_input(dir.path());
        input.pod_timeout_seconds = Some(1);

        let log = journal();
        let platform = FakePlatform::standard(log.clone())
            .with_recreation("sona-onos-2", vec![PodStatus::Pending]);
        let ctx = context(platform, Arc::new(standard_api(&log)));

        let err = recover_cluster_orchestration(&ctx, input.clone()).await.unwrap_err();

        assert!(matches!(err, RecoveryError::PodStuck { ref pod, .. } if pod == "sona-onos-2"));
        assert_eq!(deletions(&log).len(), 4);
        assert!(!entries(&log).iter().any(|e| is_reconfiguration(e)));
        assert!(!input.snapshot_path.exists());
    }

    #[tokio::test]
    async fn test_cancellation_after_teardown_purges_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let input = standard_input(dir.path());
        let token = CancellationToken::new();

        let log = journal();
        let platform = FakePlatform::standard(log.clone()).cancel_on_delete(token.clone());
        let ctx = context(platform, Arc::new(standard_api(&log))).with_cancellation(token);

        let err = recover_cluster_orchestration(&ctx, input.clone()).await.unwrap_err();

        assert!(matches!(err, RecoveryError::Cancelled));
        // Teardown finishes the step it was in, then stops at the boundary
        assert_eq!(deletions(&log).len(), 4);
        assert!(!entries(&log).iter().any(|e| e.contains(endpoints::FLOATING_IPS)));
        assert!(!input.snapshot_path.exists());
    }

    #[tokio::test]
    async fn test_failed_reconfiguration_calls_do_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let log = journal();
        let api = standard_api(&log)
            .with_failure("POST", endpoints::NODE_CONFIG, Failure::Status(500))
            .with_failure("GET", endpoints::SYNC_STATES, Failure::Transport);
        let ctx = context(FakePlatform::standard(log.clone()), Arc::new(api));

        let report = recover_cluster_orchestration(&ctx, standard_input(dir.path()))
            .await
            .unwrap();

        assert_eq!(report.phase, RunPhase::Done);
        assert_eq!(report.reconfiguration.len(), 4);
        assert_eq!(
            report.failed_reconfiguration_steps(),
            vec!["restore-config", "sync-states"]
        );
    }

    #[tokio::test]
    async fn test_parallel_waits_still_gate_reconfiguration() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = standard_input(dir.path());
        input.parallel_waits = true;

        let log = journal();
        let ctx = context(FakePlatform::standard(log.clone()), Arc::new(standard_api(&log)));

        let report = recover_cluster_orchestration(&ctx, input).await.unwrap();

        assert_eq!(report.phase, RunPhase::Done);
        let log = entries(&log);
        assert!(log[log.len() - 4..].iter().all(|e| is_reconfiguration(e)));
        assert_eq!(log.iter().filter(|e| is_reconfiguration(e)).count(), 4);
    }

    #[tokio::test]
    async fn test_cluster_manager_gate_is_a_policy() {
        let stuck_manager = |log: &Journal| {
            FakePlatform::standard(log.clone())
                .with_recreation("sona-atomix-1", vec![PodStatus::Other("Failed".to_string())])
        };

        // Default: the cluster manager is not waited on
        let dir = tempfile::tempdir().unwrap();
        let mut input = standard_input(dir.path());
        input.pod_timeout_seconds = Some(1);
        let log = journal();
        let ctx = context(stuck_manager(&log), Arc::new(standard_api(&log)));
        let report = recover_cluster_orchestration(&ctx, input.clone()).await.unwrap();
        assert_eq!(report.phase, RunPhase::Done);

        // Opt in: the stuck cluster manager now blocks the run
        input.wait_for_cluster_manager = true;
        let log = journal();
        let ctx = context(stuck_manager(&log), Arc::new(standard_api(&log)));
        let err = recover_cluster_orchestration(&ctx, input).await.unwrap_err();
        assert!(matches!(err, RecoveryError::PodStuck { ref pod, .. } if pod == "sona-atomix-1"));
    }
}
