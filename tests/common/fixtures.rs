//! Test fixtures and builder patterns for pods and nodes.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Node, NodeCondition, NodeSpec, NodeStatus, Pod, PodSpec, Taint, Toleration,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

/// Builder for creating Pod test fixtures.
///
/// # Example
/// ```
/// let pod = PodBuilder::new("web-1")
///     .node("node-a")
///     .owner("ReplicaSet", "web")
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct PodBuilder {
    name: String,
    namespace: String,
    node: Option<String>,
    owners: Vec<OwnerReference>,
    labels: BTreeMap<String, String>,
    node_selector: BTreeMap<String, String>,
    tolerations: Vec<Toleration>,
}

impl PodBuilder {
    /// Create a new builder with the given pod name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: "default".to_string(),
            node: None,
            owners: Vec::new(),
            labels: BTreeMap::new(),
            node_selector: BTreeMap::new(),
            tolerations: Vec::new(),
        }
    }

    /// Bind the pod to a node.
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Add an owner reference.
    pub fn owner(mut self, kind: &str, name: &str) -> Self {
        self.owners.push(OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            uid: format!("{kind}-{name}-uid"),
            controller: Some(self.owners.is_empty()),
            ..Default::default()
        });
        self
    }

    /// Add a label to the pod.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Require a node label.
    pub fn node_selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.node_selector.insert(key.into(), value.into());
        self
    }

    /// Tolerate any taint with the given key.
    pub fn tolerate(mut self, key: impl Into<String>) -> Self {
        self.tolerations.push(Toleration {
            key: Some(key.into()),
            operator: Some("Exists".to_string()),
            ..Default::default()
        });
        self
    }

    /// Build the Pod.
    pub fn build(self) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(self.namespace),
                labels: (!self.labels.is_empty()).then_some(self.labels),
                owner_references: (!self.owners.is_empty()).then_some(self.owners),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: self.node,
                node_selector: (!self.node_selector.is_empty()).then_some(self.node_selector),
                tolerations: (!self.tolerations.is_empty()).then_some(self.tolerations),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Builder for creating ready Node test fixtures.
#[derive(Clone, Debug)]
pub struct NodeBuilder {
    name: String,
    labels: BTreeMap<String, String>,
    taints: Vec<Taint>,
    ready: bool,
}

impl NodeBuilder {
    /// Create a new builder for a ready, untainted node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            taints: Vec::new(),
            ready: true,
        }
    }

    /// Add a label to the node.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add a NoSchedule taint.
    pub fn taint(mut self, key: impl Into<String>) -> Self {
        self.taints.push(Taint {
            key: key.into(),
            effect: "NoSchedule".to_string(),
            ..Default::default()
        });
        self
    }

    /// Mark the node as not ready.
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Build the Node.
    pub fn build(self) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(self.name),
                labels: Some(self.labels),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                taints: (!self.taints.is_empty()).then_some(self.taints),
                ..Default::default()
            }),
            status: Some(NodeStatus {
                conditions: Some(vec![NodeCondition {
                    type_: "Ready".to_string(),
                    status: if self.ready { "True" } else { "False" }.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        }
    }
}

/// `count` pods owned by `kind/owner` on `node`, named `<owner>-<node>-<i>`.
pub fn replicas(node: &str, kind: &str, owner: &str, count: usize) -> Vec<Pod> {
    (0..count)
        .map(|i| {
            PodBuilder::new(format!("{owner}-{node}-{i}"))
                .node(node)
                .owner(kind, owner)
                .label("app", owner)
                .build()
        })
        .collect()
}
