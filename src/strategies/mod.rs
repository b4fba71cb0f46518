//! Descheduling strategies.
//!
//! Each strategy decides which pods to evict from a snapshot of ready nodes and
//! spends evictions from the pass-wide [`EvictionBudget`](crate::descheduler::budget::EvictionBudget).

pub mod duplicates;
pub mod saturation;

use crate::health::Metrics;

pub use duplicates::{DuplicatePods, NodeDuplicates, OwnerKey, remove_duplicate_pods};
pub use saturation::{SaturationTable, compute_owner_saturation};

/// Policy name of the duplicates strategy
pub const REMOVE_DUPLICATES: &str = "RemoveDuplicates";

/// Settings a strategy run shares with the rest of its pass
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyOptions<'a> {
    /// Count evictions without issuing them
    pub dry_run: bool,
    /// Where to record evictions and saturation, if anywhere
    pub metrics: Option<&'a Metrics>,
}

impl StrategyOptions<'_> {
    pub fn dry_run(dry_run: bool) -> Self {
        Self {
            dry_run,
            metrics: None,
        }
    }
}
