//! kube-descheduler library crate
//!
//! Evicts duplicate pods (same owner, same node) so the scheduler can spread
//! them, while leaving alone owners that already occupy every node they could
//! run on.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`strategies`] | RemoveDuplicates: grouping, saturation analysis, eviction |
//! | [`cluster`] | Snapshot, fitness and eviction seams and their Kubernetes implementations |
//! | [`descheduler`] | Pass orchestration, eviction budget, context, errors |
//! | [`config`] / [`policy`] | Environment configuration and the policy document |
//! | [`health`] / [`leader`] | Probes, metrics and leader election for periodic mode |

pub mod cluster;
pub mod config;
pub mod descheduler;
pub mod health;
pub mod leader;
pub mod policy;
pub mod strategies;

pub use config::DeschedulerConfig;
pub use descheduler::{Context, Error, EvictionBudget, Result, run_descheduler, run_pass};
pub use health::HealthState;
pub use policy::{DeschedulerPolicy, DeschedulerStrategy};
