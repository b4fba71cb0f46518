//! Shared test support: fixtures and the in-memory cluster.

#![allow(dead_code)]

pub mod fixtures;

pub use fake_cluster::*;
pub use fixtures::*;
