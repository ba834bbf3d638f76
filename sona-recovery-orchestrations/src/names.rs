//! Name constants for recovery orchestrations

/// Orchestration names
pub mod orchestrations {
    /// Back up, tear down, wait for and reconfigure the controller cluster
    ///
    /// **Input:** [`crate::types::RecoverClusterInput`]
    /// **Output:** [`sona_recovery_models::RecoveryReport`]
    /// **Activities used:**
    /// - [`crate::activity_names::activities::RESOLVE_ADDRESS`]
    /// - [`crate::activity_names::activities::BACKUP_CONFIG`]
    /// - [`crate::activity_names::activities::DELETE_PODS`]
    /// - [`crate::activity_names::activities::WAIT_FOR_POD`]
    /// - [`crate::activity_names::activities::WAIT_FOR_APP`]
    /// - [`crate::activity_names::activities::RESTORE_CONFIG`]
    /// - [`crate::activity_names::activities::SET_ARP_MODE`]
    /// - [`crate::activity_names::activities::SYNC_STATES`]
    /// - [`crate::activity_names::activities::SYNC_RULES`]
    ///
    /// **Duration:** minutes; pod waits are unbounded unless a timeout is set
    pub const RECOVER_CLUSTER: &str = "sona-recovery::orchestration::recover-cluster";
}
