//! Whole-pass behaviour: policy handling, node readiness and failure paths.

use kube_descheduler::cluster::SchedulingPredicates;
use kube_descheduler::descheduler::{PassOptions, run_strategies};
use kube_descheduler::health::{EvictionLabels, Metrics};
use kube_descheduler::policy::{DeschedulerPolicy, DeschedulerStrategy};
use kube_descheduler::strategies::REMOVE_DUPLICATES;

use crate::common::*;

fn duplicated_cluster() -> FakeCluster {
    FakeCluster::new()
        .with_node(
            NodeBuilder::new("node-h").build(),
            replicas("node-h", "ReplicaSet", "foo", 3),
        )
        .with_node(NodeBuilder::new("node-i").build(), vec![])
}

#[tokio::test]
async fn test_default_policy_runs_remove_duplicates() {
    let cluster = duplicated_cluster();

    let evicted = run_strategies(
        &cluster,
        &SchedulingPredicates,
        &cluster,
        &DeschedulerPolicy::default(),
        PassOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(evicted, 2);
}

#[tokio::test]
async fn test_pass_options_reach_the_strategy() {
    let cluster = duplicated_cluster();
    let options = PassOptions {
        dry_run: true,
        max_pods_to_evict_per_node: 1,
        ..Default::default()
    };

    let evicted = run_strategies(
        &cluster,
        &SchedulingPredicates,
        &cluster,
        &DeschedulerPolicy::default(),
        options,
    )
    .await
    .unwrap();

    assert_eq!(evicted, 1);
    assert_eq!(cluster.pods_on("node-h").len(), 3);
}

#[tokio::test]
async fn test_disabled_and_unknown_strategies_are_skipped() {
    let cluster = duplicated_cluster();
    let mut policy = DeschedulerPolicy::default();
    policy
        .strategies
        .insert(REMOVE_DUPLICATES.to_string(), DeschedulerStrategy::default());
    policy
        .strategies
        .insert("LowNodeUtilization".to_string(), DeschedulerStrategy::enabled());

    let evicted = run_strategies(
        &cluster,
        &SchedulingPredicates,
        &cluster,
        &policy,
        PassOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(evicted, 0);
    assert!(cluster.attempts().is_empty());
}

#[tokio::test]
async fn test_not_ready_nodes_are_ignored() {
    // The only other node is not ready, so foo is saturated
    let cluster = FakeCluster::new()
        .with_node(
            NodeBuilder::new("node-h").build(),
            replicas("node-h", "ReplicaSet", "foo", 3),
        )
        .with_node(NodeBuilder::new("node-i").not_ready().build(), vec![]);

    let evicted = run_strategies(
        &cluster,
        &SchedulingPredicates,
        &cluster,
        &DeschedulerPolicy::default(),
        PassOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(evicted, 0);
}

#[tokio::test]
async fn test_empty_cluster_evicts_nothing() {
    let cluster = FakeCluster::new();

    let evicted = run_strategies(
        &cluster,
        &SchedulingPredicates,
        &cluster,
        &DeschedulerPolicy::default(),
        PassOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(evicted, 0);
}

#[tokio::test]
async fn test_node_listing_failure_fails_the_pass() {
    let cluster = duplicated_cluster().failing_node_listing();

    let err = run_strategies(
        &cluster,
        &SchedulingPredicates,
        &cluster,
        &DeschedulerPolicy::default(),
        PassOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(err.is_retryable());
    assert!(cluster.attempts().is_empty());
}

#[tokio::test]
async fn test_passes_recompute_from_fresh_snapshot() {
    let cluster = FakeCluster::new()
        .with_node(
            NodeBuilder::new("node-h").build(),
            replicas("node-h", "ReplicaSet", "foo", 4),
        )
        .with_node(NodeBuilder::new("node-i").build(), vec![]);
    let options = PassOptions {
        dry_run: false,
        max_pods_to_evict_per_node: 2,
        ..Default::default()
    };

    let policy = DeschedulerPolicy::default();
    let first = run_strategies(&cluster, &SchedulingPredicates, &cluster, &policy, options)
        .await
        .unwrap();
    let second = run_strategies(&cluster, &SchedulingPredicates, &cluster, &policy, options)
        .await
        .unwrap();

    // Each pass gets a fresh budget; the second pass sees the thinned node
    assert_eq!(first, 2);
    assert_eq!(second, 1);
    assert_eq!(cluster.pods_on("node-h"), vec!["foo-node-h-0"]);
}

#[tokio::test]
async fn test_pass_records_eviction_and_saturation_metrics() {
    let pinned: Vec<_> = (0..2)
        .map(|i| {
            PodBuilder::new(format!("bar-node-i-{i}"))
                .node("node-i")
                .owner("ReplicaSet", "bar")
                .node_selector("zone", "b")
                .build()
        })
        .collect();
    let cluster = FakeCluster::new()
        .with_node(
            NodeBuilder::new("node-h").build(),
            replicas("node-h", "ReplicaSet", "foo", 3),
        )
        .with_node(NodeBuilder::new("node-i").label("zone", "b").build(), pinned)
        .failing_eviction("foo-node-h-2");
    let metrics = Metrics::new();
    let options = PassOptions {
        metrics: Some(&metrics),
        ..Default::default()
    };

    let evicted = run_strategies(
        &cluster,
        &SchedulingPredicates,
        &cluster,
        &DeschedulerPolicy::default(),
        options,
    )
    .await
    .unwrap();

    // bar can only run on node-i, where it already runs
    assert_eq!(evicted, 1);
    assert_eq!(metrics.saturated_owners.get(), 1);
    let on_h = EvictionLabels::new(REMOVE_DUPLICATES, "node-h");
    assert_eq!(metrics.pods_evicted_total.get_or_create(&on_h).get(), 1);
    assert_eq!(metrics.eviction_failures_total.get_or_create(&on_h).get(), 1);
    assert!(
        metrics
            .encode()
            .contains("descheduler_pods_evicted_total{strategy=\"RemoveDuplicates\",node=\"node-h\"} 1")
    );
}
