//! Runtime configuration read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `DESCHEDULER_POLICY_FILE` | unset | JSON policy; unset runs `RemoveDuplicates` only |
//! | `DESCHEDULER_DRY_RUN` | `false` | Compute and log evictions without performing them |
//! | `DESCHEDULER_MAX_PODS_TO_EVICT_PER_NODE` | `0` | Per-node eviction cap per pass, `<= 0` is unlimited |
//! | `DESCHEDULER_NODE_SELECTOR` | unset | Label selector restricting the nodes considered |
//! | `DESCHEDULER_INTERVAL_SECS` | `0` | Seconds between passes, `0` runs one pass and exits |
//! | `DESCHEDULER_LEADER_ELECT` | `false` | Hold a Lease before running periodic passes |
//! | `POD_NAME` / `POD_NAMESPACE` | unset | Lease holder identity and namespace |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::descheduler::error::{Error, Result};
use crate::policy::DeschedulerPolicy;

pub const ENV_POLICY_FILE: &str = "DESCHEDULER_POLICY_FILE";
pub const ENV_DRY_RUN: &str = "DESCHEDULER_DRY_RUN";
pub const ENV_MAX_PODS_TO_EVICT_PER_NODE: &str = "DESCHEDULER_MAX_PODS_TO_EVICT_PER_NODE";
pub const ENV_NODE_SELECTOR: &str = "DESCHEDULER_NODE_SELECTOR";
pub const ENV_INTERVAL_SECS: &str = "DESCHEDULER_INTERVAL_SECS";
pub const ENV_LEADER_ELECT: &str = "DESCHEDULER_LEADER_ELECT";
pub const ENV_POD_NAME: &str = "POD_NAME";
pub const ENV_POD_NAMESPACE: &str = "POD_NAMESPACE";

/// Descheduler settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeschedulerConfig {
    /// Policy file, `None` for the built-in default policy
    pub policy_file: Option<PathBuf>,
    /// Compute evictions without performing them
    pub dry_run: bool,
    /// Per-node eviction cap for one pass (`<= 0` is unlimited)
    pub max_pods_to_evict_per_node: i32,
    /// Label selector for nodes to consider
    pub node_selector: Option<String>,
    /// Time between passes, `None` for a single pass
    pub interval: Option<Duration>,
    /// Acquire a Lease before running periodic passes
    pub leader_elect: bool,
    /// Identity of this process for leader election
    pub pod_name: Option<String>,
    /// Namespace holding the leader Lease
    pub pod_namespace: Option<String>,
}

impl DeschedulerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which returns the raw value of a variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let interval_secs: u64 = parse_or(get(ENV_INTERVAL_SECS), ENV_INTERVAL_SECS, 0)?;

        Ok(Self {
            policy_file: get(ENV_POLICY_FILE).map(PathBuf::from),
            dry_run: parse_bool(get(ENV_DRY_RUN), ENV_DRY_RUN)?,
            max_pods_to_evict_per_node: parse_or(
                get(ENV_MAX_PODS_TO_EVICT_PER_NODE),
                ENV_MAX_PODS_TO_EVICT_PER_NODE,
                0,
            )?,
            node_selector: get(ENV_NODE_SELECTOR),
            interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            leader_elect: parse_bool(get(ENV_LEADER_ELECT), ENV_LEADER_ELECT)?,
            pod_name: get(ENV_POD_NAME),
            pod_namespace: get(ENV_POD_NAMESPACE),
        })
    }

    /// Load the configured policy, or the default one when no file is set.
    pub fn load_policy(&self) -> Result<DeschedulerPolicy> {
        match self.policy_file.as_deref() {
            Some(path) => DeschedulerPolicy::from_file(path),
            None => Ok(DeschedulerPolicy::default()),
        }
    }

    /// Whether passes repeat until shutdown.
    pub fn is_periodic(&self) -> bool {
        self.interval.is_some()
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| Error::Config(format!("{key}: invalid value {value:?}"))),
        None => Ok(default),
    }
}

fn parse_bool(raw: Option<String>, key: &str) -> Result<bool> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(Error::Config(format!("{key}: invalid boolean {other:?}"))),
    }
}
