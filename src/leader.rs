//! Lease-based leader election.
//!
//! Only one replica may evict at a time. The leader holds a
//! `coordination.k8s.io` Lease and renews it in the background; losing it
//! exits the process so Kubernetes restarts it into a fresh election.

use std::time::Duration;

use kube::Client;
use kube_leader_election::{LeaseLock, LeaseLockParams};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Lease configuration
pub const LEASE_NAME: &str = "kube-descheduler-leader";
const LEASE_TTL_SECS: u64 = 15;
const LEASE_RENEW_INTERVAL_SECS: u64 = 5;

fn lease_lock(client: Client, namespace: &str, holder_id: &str) -> LeaseLock {
    LeaseLock::new(
        client,
        namespace,
        LeaseLockParams {
            holder_id: holder_id.to_string(),
            lease_name: LEASE_NAME.to_string(),
            lease_ttl: Duration::from_secs(LEASE_TTL_SECS),
        },
    )
}

/// Block until this process holds the lease.
pub async fn acquire_leadership(client: Client, namespace: &str, holder_id: &str) {
    info!(
        holder_id = %holder_id,
        namespace = %namespace,
        lease_name = LEASE_NAME,
        "Waiting to acquire leadership"
    );
    let lock = lease_lock(client, namespace, holder_id);
    loop {
        match lock.try_acquire_or_renew().await {
            Ok(result) if result.acquired_lease => {
                info!("Acquired leadership");
                return;
            }
            Ok(_) => info!("Another instance is leader, waiting..."),
            Err(e) => warn!("Failed to acquire lease: {}, retrying...", e),
        }
        tokio::time::sleep(Duration::from_secs(LEASE_RENEW_INTERVAL_SECS)).await;
    }
}

/// Renew the lease until it is lost, then exit the process.
#[allow(clippy::exit)]
pub fn spawn_lease_renewal(client: Client, namespace: &str, holder_id: &str) -> JoinHandle<()> {
    let lock = lease_lock(client, namespace, holder_id);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(LEASE_RENEW_INTERVAL_SECS)).await;

            match lock.try_acquire_or_renew().await {
                Ok(result) if result.acquired_lease => {}
                Ok(_) => {
                    error!("Lost leadership! Shutting down...");
                    std::process::exit(1);
                }
                Err(e) => {
                    error!("Failed to renew lease: {}. Shutting down...", e);
                    std::process::exit(1);
                }
            }
        }
    })
}
