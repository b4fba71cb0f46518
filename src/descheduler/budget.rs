//! Per-node eviction accounting for a single descheduling pass.

use std::collections::HashMap;

/// Counts evictions per node and enforces the per-node cap.
///
/// One budget is created at the start of a pass and handed by `&mut` to every
/// strategy run in that pass, so the cap holds across strategies. A cap of
/// zero or less means unlimited.
#[derive(Debug, Clone, Default)]
pub struct EvictionBudget {
    max_per_node: Option<usize>,
    evicted: HashMap<String, usize>,
}

impl EvictionBudget {
    /// Create a budget from the configured cap (`<= 0` is unlimited).
    pub fn new(max_pods_to_evict_per_node: i32) -> Self {
        let max_per_node = usize::try_from(max_pods_to_evict_per_node)
            .ok()
            .filter(|max| *max > 0);
        Self {
            max_per_node,
            evicted: HashMap::new(),
        }
    }

    /// Budget with no per-node cap.
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// The effective cap, `None` when unlimited.
    pub fn max_per_node(&self) -> Option<usize> {
        self.max_per_node
    }

    /// Evictions recorded so far on `node`.
    pub fn evicted_on(&self, node: &str) -> usize {
        self.evicted.get(node).copied().unwrap_or(0)
    }

    /// True when one more eviction on `node` would exceed the cap.
    pub fn is_exhausted(&self, node: &str) -> bool {
        match self.max_per_node {
            Some(max) => self.evicted_on(node) + 1 > max,
            None => false,
        }
    }

    /// Record a successful eviction on `node`.
    pub fn record(&mut self, node: &str) {
        *self.evicted.entry(node.to_string()).or_insert(0) += 1;
    }

    /// Evictions recorded across all nodes.
    pub fn total(&self) -> usize {
        self.evicted.values().sum()
    }
}
