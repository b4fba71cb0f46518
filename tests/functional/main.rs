// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Functional tests for the RemoveDuplicates strategy.
//!
//! These tests run full descheduling passes against an in-memory cluster,
//! WITHOUT requiring a live Kubernetes cluster.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run a specific test
//! cargo test --test functional test_duplicates_evicted_down_to_one
//! ```
//!
//! ## Test Categories
//!
//! - **Scenario tests**: end-to-end duplicate removal (eviction, saturation,
//!   budget, dry run, multi-owner pods)
//! - **Pass tests**: policy handling and failure paths of a whole pass

#[path = "../common/mod.rs"]
mod common;

mod pass_tests;
