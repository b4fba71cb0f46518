//! Descheduling passes.
//!
//! A pass lists the ready nodes once, opens a fresh eviction budget and runs
//! every enabled strategy of the policy against that node list in turn.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::cluster::{
    ClusterSnapshot, KubeCluster, KubeEvictor, NodeFitness, PodEvictor, SchedulingPredicates,
};
use crate::descheduler::budget::EvictionBudget;
use crate::descheduler::context::Context;
use crate::descheduler::error::Result;
use crate::policy::DeschedulerPolicy;
use crate::health::Metrics;
use crate::strategies::{REMOVE_DUPLICATES, StrategyOptions, remove_duplicate_pods};

/// Pass-wide eviction settings
#[derive(Debug, Clone, Copy, Default)]
pub struct PassOptions<'a> {
    pub dry_run: bool,
    /// Per-node eviction cap (`<= 0` is unlimited)
    pub max_pods_to_evict_per_node: i32,
    pub metrics: Option<&'a Metrics>,
}

/// Run every enabled strategy of `policy` once. Returns the pods evicted.
///
/// Only a failure to list nodes fails the pass; strategies themselves degrade
/// and keep going.
pub async fn run_strategies<S, F, E>(
    snapshot: &S,
    fitness: &F,
    evictor: &E,
    policy: &DeschedulerPolicy,
    options: PassOptions<'_>,
) -> Result<usize>
where
    S: ClusterSnapshot,
    F: NodeFitness,
    E: PodEvictor,
{
    let nodes = snapshot.ready_nodes().await?;
    if nodes.is_empty() {
        warn!("No ready nodes found, nothing to deschedule");
        return Ok(0);
    }

    let mut budget = EvictionBudget::new(options.max_pods_to_evict_per_node);
    let strategy_options = StrategyOptions {
        dry_run: options.dry_run,
        metrics: options.metrics,
    };
    let mut evicted = 0;
    for (name, strategy) in &policy.strategies {
        if !strategy.enabled {
            debug!(strategy = %name, "Strategy disabled");
            continue;
        }
        match name.as_str() {
            REMOVE_DUPLICATES => {
                let count = remove_duplicate_pods(
                    snapshot,
                    fitness,
                    evictor,
                    strategy,
                    &nodes,
                    strategy_options,
                    &mut budget,
                )
                .await;
                info!(
                    strategy = %name,
                    evicted = count,
                    dry_run = options.dry_run,
                    "Strategy finished"
                );
                evicted += count;
            }
            other => warn!(strategy = %other, "Unknown strategy, skipping"),
        }
    }
    Ok(evicted)
}

/// Run one pass against the cluster behind `ctx`.
pub async fn run_pass(ctx: Arc<Context>) -> Result<usize> {
    let start_time = Instant::now();
    let snapshot = KubeCluster::new(ctx.client.clone(), ctx.config.node_selector.clone());
    let evictor = KubeEvictor::new(ctx.clone());
    let options = PassOptions {
        dry_run: ctx.config.dry_run,
        max_pods_to_evict_per_node: ctx.config.max_pods_to_evict_per_node,
        metrics: ctx.health_state.as_ref().map(|state| &state.metrics),
    };

    let result = run_strategies(
        &snapshot,
        &SchedulingPredicates,
        &evictor,
        &ctx.policy,
        options,
    )
    .await;

    if let Some(state) = ctx.health_state.as_ref() {
        match &result {
            Ok(_) => state
                .metrics
                .record_pass(start_time.elapsed().as_secs_f64()),
            Err(_) => state.metrics.record_pass_error(),
        }
    }
    result
}

/// Run passes until cancelled, or a single pass when no interval is configured.
pub async fn run_descheduler(ctx: Arc<Context>) {
    let Some(interval) = ctx.config.interval else {
        match run_pass(ctx).await {
            Ok(evicted) => info!(evicted, "Descheduling pass complete"),
            Err(e) => error!(error = %e, "Descheduling pass failed"),
        }
        return;
    };

    info!(interval_secs = interval.as_secs(), "Starting periodic descheduling");
    if let Some(state) = ctx.health_state.as_ref() {
        state.set_ready(true).await;
    }

    loop {
        match run_pass(ctx.clone()).await {
            Ok(evicted) => info!(evicted, "Descheduling pass complete"),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "Descheduling pass failed, retrying next interval")
            }
            Err(e) => error!(error = %e, "Descheduling pass failed"),
        }
        tokio::time::sleep(interval).await;
    }
}
