//! kube-descheduler - evicts duplicate pods so the scheduler can spread them.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration and the descheduler policy
//! - Creates the Kubernetes client
//! - Runs a single pass, or in periodic mode starts the health server,
//!   optionally wins leader election, and runs passes until shutdown

use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tracing::{error, info, warn};

use kube_descheduler::health::{HealthState, run_health_server};
use kube_descheduler::leader::{acquire_leadership, spawn_lease_renewal};
use kube_descheduler::{Context, DeschedulerConfig, run_descheduler};

/// Grace period for an in-flight pass to finish issuing evictions during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kube_descheduler=info".parse()?)
                .add_directive("kube=info".parse()?)
                .add_directive("kube_leader_election=info".parse()?),
        )
        .json()
        .init();

    info!("Starting kube-descheduler");

    let config = DeschedulerConfig::from_env()?;
    let policy = config.load_policy()?;
    info!(
        dry_run = config.dry_run,
        max_pods_to_evict_per_node = config.max_pods_to_evict_per_node,
        node_selector = ?config.node_selector,
        strategies = ?policy.strategies.keys().collect::<Vec<_>>(),
        "Loaded configuration"
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    if !config.is_periodic() {
        let ctx = Arc::new(Context::new(client, config, policy, None));
        run_descheduler(ctx).await;
        info!("Descheduler stopped");
        return Ok(());
    }

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    // Start health server immediately (probes should work even as non-leader)
    let health_handle = {
        let health_state = health_state.clone();
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let lease_renewal_handle = if config.leader_elect {
        let holder_id = config.pod_name.clone().unwrap_or_else(|| {
            warn!("POD_NAME not set, using hostname");
            hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string())
        });
        let namespace = config.pod_namespace.clone().unwrap_or_else(|| {
            warn!("POD_NAMESPACE not set, using 'default'");
            "default".to_string()
        });

        acquire_leadership(client.clone(), &namespace, &holder_id).await;
        Some(spawn_lease_renewal(client.clone(), &namespace, &holder_id))
    } else {
        None
    };

    let ctx = Arc::new(Context::new(
        client,
        config,
        policy,
        Some(health_state.clone()),
    ));
    let descheduler_handle = tokio::spawn(run_descheduler(ctx));

    tokio::select! {
        result = descheduler_handle => {
            if let Err(e) = result {
                error!("Descheduler task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        // Lease renewal only exits via process::exit() or panic
        result = async {
            match lease_renewal_handle {
                Some(handle) => handle.await,
                None => std::future::pending().await,
            }
        } => {
            if let Err(e) = result {
                error!("Lease renewal task panicked: {}", e);
            }
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");
            health_state.set_ready(false).await;

            info!(
                "Waiting {}s for in-flight evictions to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;
        }
    }

    info!("Descheduler stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Signal handler setup failures are fatal, so expect() is used here.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
