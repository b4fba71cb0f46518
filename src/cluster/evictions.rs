//! Pod eviction through the Kubernetes Eviction subresource.
//!
//! Evictions go through the API server so PodDisruptionBudgets are honoured; a
//! budget that blocks the eviction comes back as HTTP 429 and is reported as a
//! failed eviction like any other error.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use kube::api::EvictParams;
use kube::{Api, ResourceExt};
use tracing::{debug, info, warn};

use super::PodEvictor;
use crate::descheduler::context::Context;
use crate::descheduler::error::{Error, Result};

/// Event reason published on evicted pods
pub const EVICTION_EVENT_REASON: &str = "Descheduled";

/// [`PodEvictor`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeEvictor {
    ctx: Arc<Context>,
}

impl KubeEvictor {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }
}

impl PodEvictor for KubeEvictor {
    async fn evict(&self, pod: &Pod, dry_run: bool) -> Result<()> {
        let name = pod.name_any();
        let namespace = pod.namespace().unwrap_or_else(|| "default".to_string());

        if dry_run {
            info!(pod = %name, namespace = %namespace, "Dry run: would evict pod");
            return Ok(());
        }

        let api: Api<Pod> = Api::namespaced(self.ctx.client.clone(), &namespace);
        match api.evict(&name, &EvictParams::default()).await {
            Ok(_) => {
                debug!(pod = %name, namespace = %namespace, "Eviction accepted");
                self.ctx
                    .publish_pod_event(
                        pod,
                        EVICTION_EVENT_REASON,
                        "Evict",
                        Some("Evicted duplicate pod so it can be rescheduled".to_string()),
                    )
                    .await;
                Ok(())
            }
            Err(e) => {
                let err = Error::from(e);
                if err.is_too_many_requests() {
                    warn!(
                        pod = %name,
                        namespace = %namespace,
                        "Eviction blocked by disruption budget"
                    );
                } else if err.is_not_found() {
                    debug!(pod = %name, namespace = %namespace, "Pod already gone");
                }
                Err(err)
            }
        }
    }
}
