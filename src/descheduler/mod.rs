//! Descheduler core: pass orchestration, shared context, eviction budget and errors.

pub mod budget;
pub mod context;
pub mod error;
pub mod runner;

pub use budget::EvictionBudget;
pub use context::Context;
pub use error::{Error, Result};
pub use runner::{PassOptions, run_descheduler, run_pass, run_strategies};
