//! Owner saturation analysis.
//!
//! An owner is saturated when it already has a pod on every node it could be
//! scheduled to. Evicting one of its duplicates cannot improve the spread, so
//! saturated owners are left alone for the whole pass.

use std::collections::BTreeMap;

use tracing::debug;

use super::duplicates::{NodeDuplicates, OwnerKey};
use crate::cluster::NodeFitness;

/// Saturation verdict per owner for one pass.
///
/// Owners missing from the table are not saturated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaturationTable {
    owners: BTreeMap<OwnerKey, bool>,
}

impl SaturationTable {
    pub fn is_saturated(&self, owner: &OwnerKey) -> bool {
        self.owners.get(owner).copied().unwrap_or(false)
    }

    /// Number of owners analysed.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn saturated_owners(&self) -> impl Iterator<Item = &OwnerKey> {
        self.owners
            .iter()
            .filter_map(|(owner, saturated)| saturated.then_some(owner))
    }
}

/// Compute which owners are saturated across `node_duplicates`.
///
/// For every owner the representative pod is the first pod of its group on the
/// first node (in snapshot order) where it runs. The owner is saturated when
/// the number of nodes that pod fits and tolerates equals the number of nodes
/// the owner already runs on. Fitness is evaluated once per (owner, node) pair.
pub fn compute_owner_saturation<F: NodeFitness>(
    fitness: &F,
    node_duplicates: &[NodeDuplicates],
) -> SaturationTable {
    let mut assigned_nodes: BTreeMap<&OwnerKey, Vec<&NodeDuplicates>> = BTreeMap::new();
    for entry in node_duplicates {
        for owner in entry.duplicates.keys() {
            assigned_nodes.entry(owner).or_default().push(entry);
        }
    }

    let mut owners = BTreeMap::new();
    for (owner, assigned) in assigned_nodes {
        let representative = assigned
            .first()
            .and_then(|entry| entry.duplicates.get(owner))
            .and_then(|pods| pods.first());
        let Some(pod) = representative else {
            continue;
        };

        let possible = node_duplicates
            .iter()
            .filter(|entry| {
                fitness.fits_node(pod, &entry.node) && fitness.tolerates_taints(pod, &entry.node)
            })
            .count();
        let saturated = possible == assigned.len();
        debug!(
            owner = %owner,
            possible_nodes = possible,
            assigned_nodes = assigned.len(),
            saturated,
            "Computed owner saturation"
        );
        owners.insert(owner.clone(), saturated);
    }

    SaturationTable { owners }
}
