//! Cluster-facing collaborators of the descheduling strategies.
//!
//! Strategies only see the cluster through the three traits below, which keeps
//! the decision logic testable against an in-memory cluster. The submodules
//! hold the Kubernetes-backed implementations:
//!
//! | Trait | Implementation |
//! |-------|----------------|
//! | [`ClusterSnapshot`] | [`pods::KubeCluster`] |
//! | [`NodeFitness`] | [`nodes::SchedulingPredicates`] |
//! | [`PodEvictor`] | [`evictions::KubeEvictor`] |

use std::future::Future;

use k8s_openapi::api::core::v1::{Node, Pod};

use crate::descheduler::error::Result;

pub mod evictions;
pub mod nodes;
pub mod pods;

pub use evictions::KubeEvictor;
pub use nodes::SchedulingPredicates;
pub use pods::KubeCluster;

/// Source of the nodes and pods a pass works on.
///
/// Queried fresh on every pass; implementations must not cache across passes.
pub trait ClusterSnapshot {
    /// Schedulable nodes in the order the pass should visit them.
    fn ready_nodes(&self) -> impl Future<Output = Result<Vec<Node>>> + Send;

    /// Pods on `node` that may be evicted, in listing order.
    fn evictable_pods_on_node(&self, node: &Node)
    -> impl Future<Output = Result<Vec<Pod>>> + Send;
}

/// Scheduling predicates deciding whether a pod could run on a node.
pub trait NodeFitness {
    /// Node selector and required node affinity accept the node.
    fn fits_node(&self, pod: &Pod, node: &Node) -> bool;

    /// Every scheduling-relevant taint on the node is tolerated.
    fn tolerates_taints(&self, pod: &Pod, node: &Node) -> bool;
}

/// Issues a single pod eviction.
pub trait PodEvictor {
    /// Evict `pod`. With `dry_run` set no cluster state may change.
    ///
    /// Evicting a pod that no longer exists is an error, not a panic.
    fn evict(&self, pod: &Pod, dry_run: bool) -> impl Future<Output = Result<()>> + Send;
}
