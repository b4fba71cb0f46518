//! Node readiness and the scheduling predicates used for saturation analysis.
//!
//! These mirror the scheduler's `NodeSelector`/`NodeAffinity` and
//! `TaintToleration` filters closely enough to answer "could this pod land
//! here", without looking at resource capacity.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Node, NodeSelectorRequirement, NodeSelectorTerm, Pod, Taint, Toleration,
};
use kube::ResourceExt;

use super::NodeFitness;

/// Taint effects the scheduler honours when placing a pod.
const SCHEDULING_TAINT_EFFECTS: [&str; 2] = ["NoSchedule", "NoExecute"];

/// Field key usable in node selector `matchFields`.
const NODE_NAME_FIELD: &str = "metadata.name";

/// Kubernetes-semantics implementation of [`NodeFitness`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulingPredicates;

impl NodeFitness for SchedulingPredicates {
    fn fits_node(&self, pod: &Pod, node: &Node) -> bool {
        pod_matches_node_selector(pod, node)
    }

    fn tolerates_taints(&self, pod: &Pod, node: &Node) -> bool {
        pod_tolerates_node_taints(pod, node)
    }
}

/// Check the node's `Ready` condition.
pub fn is_node_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}

/// Keep ready nodes and sort them by name so passes visit nodes in a stable order.
pub fn ready_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut ready: Vec<Node> = nodes.into_iter().filter(is_node_ready).collect();
    ready.sort_by_key(|node| node.name_any());
    ready
}

/// Check the pod's `nodeSelector` and required node affinity against the node.
pub fn pod_matches_node_selector(pod: &Pod, node: &Node) -> bool {
    let Some(spec) = pod.spec.as_ref() else {
        return true;
    };
    let labels = node.labels();

    if let Some(selector) = spec.node_selector.as_ref() {
        let all_match = selector
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value));
        if !all_match {
            return false;
        }
    }

    let required = spec
        .affinity
        .as_ref()
        .and_then(|a| a.node_affinity.as_ref())
        .and_then(|na| na.required_during_scheduling_ignored_during_execution.as_ref());

    match required {
        // Terms are ORed
        Some(node_selector) => node_selector
            .node_selector_terms
            .iter()
            .any(|term| node_selector_term_matches(term, &node.name_any(), labels)),
        None => true,
    }
}

/// A term matches when all of its requirements match. An empty term matches nothing.
fn node_selector_term_matches(
    term: &NodeSelectorTerm,
    node_name: &str,
    labels: &BTreeMap<String, String>,
) -> bool {
    let expressions = term.match_expressions.as_deref().unwrap_or_default();
    let fields = term.match_fields.as_deref().unwrap_or_default();
    if expressions.is_empty() && fields.is_empty() {
        return false;
    }

    expressions
        .iter()
        .all(|req| requirement_matches(req, labels.get(&req.key).map(String::as_str)))
        && fields.iter().all(|req| {
            let value = (req.key == NODE_NAME_FIELD).then_some(node_name);
            match req.operator.as_str() {
                "In" | "NotIn" => requirement_matches(req, value),
                _ => false,
            }
        })
}

/// Evaluate one requirement against the node's value for its key.
fn requirement_matches(req: &NodeSelectorRequirement, value: Option<&str>) -> bool {
    let values = req.values.as_deref().unwrap_or_default();
    match req.operator.as_str() {
        "In" => value.is_some_and(|v| values.iter().any(|candidate| candidate == v)),
        "NotIn" => !value.is_some_and(|v| values.iter().any(|candidate| candidate == v)),
        "Exists" => value.is_some(),
        "DoesNotExist" => value.is_none(),
        "Gt" | "Lt" => {
            let [bound] = values else {
                return false;
            };
            let actual = value.and_then(|v| v.parse::<i64>().ok());
            let (Some(actual), Ok(bound)) = (actual, bound.parse::<i64>()) else {
                return false;
            };
            if req.operator == "Gt" {
                actual > bound
            } else {
                actual < bound
            }
        }
        _ => false,
    }
}

/// Check that every `NoSchedule`/`NoExecute` taint on the node is tolerated.
pub fn pod_tolerates_node_taints(pod: &Pod, node: &Node) -> bool {
    let taints = node
        .spec
        .as_ref()
        .and_then(|spec| spec.taints.as_deref())
        .unwrap_or_default();
    let tolerations = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.tolerations.as_deref())
        .unwrap_or_default();

    taints
        .iter()
        .filter(|taint| SCHEDULING_TAINT_EFFECTS.contains(&taint.effect.as_str()))
        .all(|taint| {
            tolerations
                .iter()
                .any(|toleration| toleration_tolerates_taint(toleration, taint))
        })
}

/// Kubernetes toleration matching: empty effect or key act as wildcards.
pub fn toleration_tolerates_taint(toleration: &Toleration, taint: &Taint) -> bool {
    if let Some(effect) = toleration.effect.as_deref().filter(|e| !e.is_empty()) {
        if effect != taint.effect {
            return false;
        }
    }
    if let Some(key) = toleration.key.as_deref().filter(|k| !k.is_empty()) {
        if key != taint.key {
            return false;
        }
    }

    match toleration.operator.as_deref().unwrap_or("Equal") {
        "Exists" => true,
        "" | "Equal" => {
            toleration.value.as_deref().unwrap_or_default()
                == taint.value.as_deref().unwrap_or_default()
        }
        _ => false,
    }
}
