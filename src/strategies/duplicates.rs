//! RemoveDuplicates strategy.
//!
//! Two pods are duplicates when they sit on the same node and share an owner
//! (same kind and name; the owner is assumed to live in the pod's namespace).
//! For every non-saturated owner the first pod of each node's group is kept and
//! the rest are evicted, so the scheduler gets a chance to spread them.
//!
//! ## Pass layout
//!
//! 1. [`collect_node_duplicates`] groups the evictable pods of every node.
//! 2. [`compute_owner_saturation`] marks owners that already run on every node
//!    they could run on; evicting those would only land the pod back on a node
//!    that already has one.
//! 3. [`delete_duplicate_pods`] evicts within the per-node budget.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;
use tracing::{debug, info, warn};

use super::saturation::{SaturationTable, compute_owner_saturation};
use super::{REMOVE_DUPLICATES, StrategyOptions};
use crate::cluster::pods::owner_refs;
use crate::cluster::{ClusterSnapshot, NodeFitness, PodEvictor};
use crate::descheduler::budget::EvictionBudget;
use crate::policy::DeschedulerStrategy;

/// Identity of a pod's owning controller within a namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerKey {
    pub kind: String,
    pub name: String,
}

impl OwnerKey {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl From<&OwnerReference> for OwnerKey {
    fn from(owner: &OwnerReference) -> Self {
        Self::new(owner.kind.clone(), owner.name.clone())
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Pods of one node grouped by owner, each group in listing order.
pub type DuplicatePods = BTreeMap<OwnerKey, Vec<Pod>>;

/// A node together with its duplicate groups.
#[derive(Debug, Clone)]
pub struct NodeDuplicates {
    pub node: Node,
    pub duplicates: DuplicatePods,
}

impl NodeDuplicates {
    pub fn node_name(&self) -> String {
        self.node.name_any()
    }
}

/// Group pods by owner. A pod with several owners joins several groups; a pod
/// without owners joins none.
pub fn find_duplicate_pods(pods: &[Pod]) -> DuplicatePods {
    let mut duplicates = DuplicatePods::new();
    for pod in pods {
        for owner in owner_refs(pod) {
            duplicates
                .entry(OwnerKey::from(owner))
                .or_default()
                .push(pod.clone());
        }
    }
    duplicates
}

/// List and group the evictable pods of one node.
///
/// A listing failure leaves the node without groups; the pass carries on.
pub async fn list_duplicate_pods_on_node<S: ClusterSnapshot>(
    snapshot: &S,
    node: &Node,
) -> DuplicatePods {
    match snapshot.evictable_pods_on_node(node).await {
        Ok(pods) => find_duplicate_pods(&pods),
        Err(e) => {
            warn!(node = %node.name_any(), error = %e, "Failed to list pods on node, skipping");
            DuplicatePods::new()
        }
    }
}

/// Group the pods of every node, preserving node order.
pub async fn collect_node_duplicates<S: ClusterSnapshot>(
    snapshot: &S,
    nodes: &[Node],
) -> Vec<NodeDuplicates> {
    let mut by_node = Vec::with_capacity(nodes.len());
    for node in nodes {
        let duplicates = list_duplicate_pods_on_node(snapshot, node).await;
        by_node.push(NodeDuplicates {
            node: node.clone(),
            duplicates,
        });
    }
    by_node
}

/// Evict all but the first pod of every duplicate group whose owner is not
/// saturated. Returns the number of pods evicted.
///
/// Once a node's budget is spent no further pod on that node is considered,
/// whatever group it belongs to. Failed evictions are logged, not counted and
/// not retried.
pub async fn delete_duplicate_pods<E: PodEvictor>(
    evictor: &E,
    node_duplicates: &[NodeDuplicates],
    saturation: &SaturationTable,
    options: StrategyOptions<'_>,
    budget: &mut EvictionBudget,
) -> usize {
    let mut pods_evicted = 0;
    for entry in node_duplicates {
        let node_name = entry.node_name();
        info!(node = %node_name, "Processing node");
        let evicted =
            evict_duplicates_on_node(evictor, entry, &node_name, saturation, options, budget).await;
        if evicted > 0 {
            info!(node = %node_name, evicted, "Evicted duplicate pods");
        }
        pods_evicted += evicted;
    }
    pods_evicted
}

async fn evict_duplicates_on_node<E: PodEvictor>(
    evictor: &E,
    entry: &NodeDuplicates,
    node_name: &str,
    saturation: &SaturationTable,
    options: StrategyOptions<'_>,
    budget: &mut EvictionBudget,
) -> usize {
    let mut evicted = 0;
    for (owner, pods) in &entry.duplicates {
        if pods.len() < 2 || saturation.is_saturated(owner) {
            continue;
        }
        debug!(node = %node_name, owner = %owner, pods = pods.len(), "Found duplicate pods");

        // The first pod of a group is never evicted
        for pod in pods.iter().skip(1) {
            if budget.is_exhausted(node_name) {
                debug!(
                    node = %node_name,
                    evicted = budget.evicted_on(node_name),
                    "Eviction budget exhausted"
                );
                return evicted;
            }
            match evictor.evict(pod, options.dry_run).await {
                Ok(()) => {
                    budget.record(node_name);
                    evicted += 1;
                    if let Some(metrics) = options.metrics {
                        metrics.record_eviction(REMOVE_DUPLICATES, node_name);
                    }
                    debug!(node = %node_name, owner = %owner, pod = %pod.name_any(), "Evicted pod");
                }
                Err(e) => {
                    if let Some(metrics) = options.metrics {
                        metrics.record_eviction_failure(REMOVE_DUPLICATES, node_name);
                    }
                    warn!(
                        node = %node_name,
                        owner = %owner,
                        pod = %pod.name_any(),
                        error = %e,
                        "Error evicting pod"
                    );
                }
            }
        }
    }
    evicted
}

/// Run the RemoveDuplicates strategy over `nodes`.
///
/// Saturation is computed once, before any eviction, so every decision in the
/// pass sees the same snapshot. Returns the number of pods evicted.
pub async fn remove_duplicate_pods<S, F, E>(
    snapshot: &S,
    fitness: &F,
    evictor: &E,
    strategy: &DeschedulerStrategy,
    nodes: &[Node],
    options: StrategyOptions<'_>,
    budget: &mut EvictionBudget,
) -> usize
where
    S: ClusterSnapshot,
    F: NodeFitness,
    E: PodEvictor,
{
    if !strategy.enabled {
        return 0;
    }

    let node_duplicates = collect_node_duplicates(snapshot, nodes).await;
    let saturation = compute_owner_saturation(fitness, &node_duplicates);
    if let Some(metrics) = options.metrics {
        metrics.set_saturated_owners(saturation.saturated_owners().count());
    }
    delete_duplicate_pods(evictor, &node_duplicates, &saturation, options, budget).await
}
