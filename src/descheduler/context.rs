//! Shared context for descheduling passes.
//!
//! The Context struct holds what every pass needs: the Kubernetes client,
//! configuration, policy, event reporter identity and optional health state.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};

use crate::config::DeschedulerConfig;
use crate::health::HealthState;
use crate::policy::DeschedulerPolicy;

/// Controller name reported on events
pub const REPORTER_NAME: &str = "kube-descheduler";

/// Shared context for descheduling passes
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Runtime configuration
    pub config: DeschedulerConfig,
    /// Strategies to run
    pub policy: DeschedulerPolicy,
    /// Event reporter identity
    reporter: Reporter,
    /// Optional health state for metrics and readiness
    pub health_state: Option<Arc<HealthState>>,
}

impl Context {
    /// Create a new context
    pub fn new(
        client: Client,
        config: DeschedulerConfig,
        policy: DeschedulerPolicy,
        health_state: Option<Arc<HealthState>>,
    ) -> Self {
        let reporter = Reporter {
            controller: REPORTER_NAME.into(),
            instance: config.pod_name.clone(),
        };
        Self {
            client,
            config,
            policy,
            reporter,
            health_state,
        }
    }

    /// Create an event recorder for publishing Kubernetes events
    fn recorder(&self) -> Recorder {
        Recorder::new(self.client.clone(), self.reporter.clone())
    }

    /// Publish a normal event on a pod
    pub async fn publish_pod_event(&self, pod: &Pod, reason: &str, action: &str, note: Option<String>) {
        let recorder = self.recorder();
        let object_ref = pod.object_ref(&());
        if let Err(e) = recorder
            .publish(
                &Event {
                    type_: EventType::Normal,
                    reason: reason.into(),
                    note,
                    action: action.into(),
                    secondary: None,
                },
                &object_ref,
            )
            .await
        {
            tracing::warn!(reason = %reason, error = %e, "Failed to publish event");
        }
    }
}
