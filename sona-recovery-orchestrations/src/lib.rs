//! SONA Recovery Orchestrations - disaster recovery steps for a SONA controller cluster
//!
//! This crate provides the recovery orchestration and the activities it is
//! built from: address resolution, configuration backup, pod teardown,
//! readiness waits, and reconfiguration of the first controller replica.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sona_recovery_orchestrations::context::RecoveryContext;
//! use sona_recovery_orchestrations::controller_api::{Credentials, HttpControllerApi, DEFAULT_API_PORT};
//! use sona_recovery_orchestrations::k8s_client::KubePlatform;
//! use sona_recovery_orchestrations::{recover_cluster_orchestration, RecoverClusterInput};
//!
//! # async fn example(input: RecoverClusterInput) -> anyhow::Result<()> {
//! let platform = KubePlatform::try_default().await?;
//! let api = HttpControllerApi::new(DEFAULT_API_PORT, Credentials::new("onos", "rocks"), Duration::from_secs(10))?;
//! let ctx = RecoveryContext::new(Arc::new(platform), Arc::new(api));
//!
//! let report = recover_cluster_orchestration(&ctx, input).await?;
//! println!("Recovered in {}s", report.elapsed_seconds());
//! # Ok(())
//! # }
//! ```

// Orchestration exports
pub mod names;
pub mod types;

// Activity exports
pub mod activity_names;
pub mod activity_types;
pub mod controller_api;
pub mod k8s_client;

pub mod context;
pub mod error;
pub mod poll;
pub mod snapshot;

mod activities;
mod orchestrations;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use activities::wait_for_app::is_activated;
pub use activity_types::*;
pub use error::RecoveryError;
pub use orchestrations::recover_cluster::recover_cluster_orchestration;
pub use types::*;
