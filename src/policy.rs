//! Descheduler policy document.
//!
//! The policy names the strategies to run and whether each is enabled:
//!
//! ```json
//! {
//!   "apiVersion": "descheduler/v1alpha1",
//!   "kind": "DeschedulerPolicy",
//!   "strategies": {
//!     "RemoveDuplicates": { "enabled": true }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descheduler::error::{Error, Result};
use crate::strategies::REMOVE_DUPLICATES;

/// Accepted `apiVersion` of a policy document.
pub const POLICY_API_VERSION: &str = "descheduler/v1alpha1";

/// Accepted `kind` of a policy document.
pub const POLICY_KIND: &str = "DeschedulerPolicy";

/// Strategies to run on each pass, keyed by strategy name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeschedulerPolicy {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub strategies: BTreeMap<String, DeschedulerStrategy>,
}

/// Settings of one strategy.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeschedulerStrategy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub weight: i32,
    /// Strategy-specific parameters, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl DeschedulerStrategy {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }
}

impl Default for DeschedulerPolicy {
    /// Policy used when no policy file is configured: duplicates removal only.
    fn default() -> Self {
        let mut strategies = BTreeMap::new();
        strategies.insert(REMOVE_DUPLICATES.to_string(), DeschedulerStrategy::enabled());
        Self {
            api_version: POLICY_API_VERSION.to_string(),
            kind: POLICY_KIND.to_string(),
            strategies,
        }
    }
}

impl DeschedulerPolicy {
    /// Parse and validate a JSON policy document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(raw)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Read a policy document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Reject documents of another kind or version.
    pub fn validate(&self) -> Result<()> {
        if self.api_version != POLICY_API_VERSION {
            return Err(Error::Policy(format!(
                "unsupported apiVersion {:?}, expected {:?}",
                self.api_version, POLICY_API_VERSION
            )));
        }
        if self.kind != POLICY_KIND {
            return Err(Error::Policy(format!(
                "unsupported kind {:?}, expected {:?}",
                self.kind, POLICY_KIND
            )));
        }
        Ok(())
    }

    /// Settings of a strategy, if the policy mentions it.
    pub fn strategy(&self, name: &str) -> Option<&DeschedulerStrategy> {
        self.strategies.get(name)
    }

    /// Whether the named strategy is present and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.strategy(name).is_some_and(|s| s.enabled)
    }
}
