//! Name constants for recovery activities
//!
//! Naming convention: {crate-name}::activity::{name}. The names tag log
//! events and reconfiguration outcomes.

/// Activity names
pub mod activities {
    /// Resolve a pod's current IP address
    ///
    /// **Input:** [`crate::activity_types::ResolveAddressInput`]
    /// **Output:** [`crate::activity_types::ResolveAddressOutput`]
    /// **Fails with:** `AddressUnavailable` when the pod is not listed or has no IP
    pub const RESOLVE_ADDRESS: &str = "sona-recovery::activity::resolve-address";

    /// Export the node configuration into the local snapshot file
    ///
    /// **Input:** [`crate::activity_types::BackupConfigInput`]
    /// **Output:** [`crate::activity_types::BackupConfigOutput`]
    /// **Idempotent:** Yes (the previous snapshot is always replaced)
    pub const BACKUP_CONFIG: &str = "sona-recovery::activity::backup-config";

    /// Delete every pod of the topology
    ///
    /// **Input:** [`crate::activity_types::DeletePodsInput`]
    /// **Output:** [`crate::activity_types::DeletePodsOutput`]
    /// **Idempotent:** Yes (already absent pods are skipped)
    pub const DELETE_PODS: &str = "sona-recovery::activity::delete-pods";

    /// Wait for a deleted pod to be listed again and reach Running
    ///
    /// **Input:** [`crate::activity_types::WaitForPodInput`]
    /// **Output:** [`crate::activity_types::WaitForPodOutput`]
    pub const WAIT_FOR_POD: &str = "sona-recovery::activity::wait-for-pod";

    /// Wait for a replica's apps to answer the activation probe with 200
    ///
    /// **Input:** [`crate::activity_types::WaitForAppInput`]
    /// **Output:** [`crate::activity_types::WaitForAppOutput`]
    pub const WAIT_FOR_APP: &str = "sona-recovery::activity::wait-for-app";

    /// POST the snapshot back to the node configuration endpoint
    pub const RESTORE_CONFIG: &str = "sona-recovery::activity::restore-config";

    /// Set ARP mode (broadcast or proxy)
    pub const SET_ARP_MODE: &str = "sona-recovery::activity::set-arp-mode";

    /// Reconcile controller state against the cloud-networking source of truth
    pub const SYNC_STATES: &str = "sona-recovery::activity::sync-states";

    /// Reinstall dataplane flow rules from the synced state
    pub const SYNC_RULES: &str = "sona-recovery::activity::sync-rules";
}

/// Last `::` segment of a fully qualified name
pub fn short_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}
