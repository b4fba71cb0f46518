//! Pod listing and the evictability filter.
//!
//! A pod is evictable unless it is a mirror pod, owned by a DaemonSet, critical
//! to the cluster, or bound to node-local storage.

use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

use super::{ClusterSnapshot, nodes};
use crate::descheduler::error::Result;

/// Annotation set by the kubelet on static (mirror) pods.
pub const MIRROR_POD_ANNOTATION: &str = "kubernetes.io/config.mirror";

/// Legacy annotation marking a pod as critical.
pub const CRITICAL_POD_ANNOTATION: &str = "scheduler.alpha.kubernetes.io/critical-pod";

/// Priority at and above which pods are system critical.
pub const SYSTEM_CRITICAL_PRIORITY: i32 = 2_000_000_000;

/// Owner references of a pod, in declaration order.
pub fn owner_refs(pod: &Pod) -> &[OwnerReference] {
    pod.owner_references()
}

pub fn is_mirror_pod(pod: &Pod) -> bool {
    pod.annotations().contains_key(MIRROR_POD_ANNOTATION)
}

pub fn is_daemonset_pod(pod: &Pod) -> bool {
    owner_refs(pod).iter().any(|owner| owner.kind == "DaemonSet")
}

pub fn is_critical_pod(pod: &Pod) -> bool {
    pod.annotations().contains_key(CRITICAL_POD_ANNOTATION)
        || pod
            .spec
            .as_ref()
            .and_then(|spec| spec.priority)
            .is_some_and(|priority| priority >= SYSTEM_CRITICAL_PRIORITY)
}

/// emptyDir and hostPath volumes die with the pod's node placement.
pub fn has_local_storage(pod: &Pod) -> bool {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.volumes.as_ref())
        .is_some_and(|volumes| {
            volumes
                .iter()
                .any(|v| v.empty_dir.is_some() || v.host_path.is_some())
        })
}

/// Whether a descheduling strategy may evict this pod.
pub fn is_evictable(pod: &Pod) -> bool {
    !is_mirror_pod(pod)
        && !is_daemonset_pod(pod)
        && !is_critical_pod(pod)
        && !has_local_storage(pod)
}

/// Field selector for pods bound to `node_name` that have not terminated.
pub fn active_pods_field_selector(node_name: &str) -> String {
    format!("spec.nodeName={node_name},status.phase!=Succeeded,status.phase!=Failed")
}

/// [`ClusterSnapshot`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    node_selector: Option<String>,
}

impl KubeCluster {
    /// Create a snapshot provider, optionally restricted to nodes matching a label selector.
    pub fn new(client: Client, node_selector: Option<String>) -> Self {
        Self {
            client,
            node_selector,
        }
    }
}

impl ClusterSnapshot for KubeCluster {
    async fn ready_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let mut params = ListParams::default();
        if let Some(selector) = self.node_selector.as_deref() {
            params = params.labels(selector);
        }

        let listed = api.list(&params).await?.items;
        let total = listed.len();
        let ready = nodes::ready_nodes(listed);
        debug!(total, ready = ready.len(), "Listed nodes");
        Ok(ready)
    }

    async fn evictable_pods_on_node(&self, node: &Node) -> Result<Vec<Pod>> {
        let node_name = node.name_any();
        let api: Api<Pod> = Api::all(self.client.clone());
        let params = ListParams::default().fields(&active_pods_field_selector(&node_name));

        let pods: Vec<Pod> = api
            .list(&params)
            .await?
            .items
            .into_iter()
            .filter(is_evictable)
            .collect();
        debug!(node = %node_name, evictable = pods.len(), "Listed evictable pods");
        Ok(pods)
    }
}
