//! Health server for Kubernetes probes and Prometheus metrics.
//!
//! Provides:
//! - `/healthz` - Liveness probe (always returns 200 if server is running)
//! - `/readyz` - Readiness probe (returns 200 once passes are being scheduled)
//! - `/metrics` - Prometheus metrics endpoint

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabel, EncodeLabelSet, LabelSetEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use tokio::sync::RwLock;
use tracing::info;

/// Port the health server binds to
pub const HEALTH_PORT: u16 = 8080;

/// Labels for per-strategy, per-node eviction metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct EvictionLabels {
    pub strategy: String,
    pub node: String,
}

impl EvictionLabels {
    pub fn new(strategy: &str, node: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            node: node.to_string(),
        }
    }
}

impl EncodeLabelSet for EvictionLabels {
    fn encode(&self, encoder: &mut LabelSetEncoder<'_>) -> Result<(), std::fmt::Error> {
        ("strategy", self.strategy.as_str()).encode(encoder.encode_label())?;
        ("node", self.node.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Shared metrics for the descheduler
#[derive(Debug)]
pub struct Metrics {
    /// Pods evicted (or counted in dry run), by strategy and node
    pub pods_evicted_total: Family<EvictionLabels, Counter>,
    /// Evictions that failed, by strategy and node
    pub eviction_failures_total: Family<EvictionLabels, Counter>,
    /// Completed passes
    pub passes_total: Counter,
    /// Passes that could not run
    pub pass_errors_total: Counter,
    /// Pass duration histogram
    pub pass_duration_seconds: Histogram,
    /// Owners found saturated by the most recent analysis
    pub saturated_owners: Gauge,
    /// Prometheus registry
    registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance with registered metrics
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let pods_evicted_total = Family::<EvictionLabels, Counter>::default();
        registry.register(
            "descheduler_pods_evicted",
            "Total number of pods evicted",
            pods_evicted_total.clone(),
        );

        let eviction_failures_total = Family::<EvictionLabels, Counter>::default();
        registry.register(
            "descheduler_eviction_failures",
            "Total number of failed pod evictions",
            eviction_failures_total.clone(),
        );

        let passes_total = Counter::default();
        registry.register(
            "descheduler_passes",
            "Total number of completed descheduling passes",
            passes_total.clone(),
        );

        let pass_errors_total = Counter::default();
        registry.register(
            "descheduler_pass_errors",
            "Total number of descheduling passes that failed to run",
            pass_errors_total.clone(),
        );

        let pass_duration_seconds = Histogram::new(exponential_buckets(0.01, 2.0, 15));
        registry.register(
            "descheduler_pass_duration_seconds",
            "Duration of a descheduling pass in seconds",
            pass_duration_seconds.clone(),
        );

        let saturated_owners = Gauge::default();
        registry.register(
            "descheduler_saturated_owners",
            "Number of owners already running on every node they fit",
            saturated_owners.clone(),
        );

        Self {
            pods_evicted_total,
            eviction_failures_total,
            passes_total,
            pass_errors_total,
            pass_duration_seconds,
            saturated_owners,
            registry,
        }
    }

    /// Record a successful eviction
    pub fn record_eviction(&self, strategy: &str, node: &str) {
        self.pods_evicted_total
            .get_or_create(&EvictionLabels::new(strategy, node))
            .inc();
    }

    /// Record a failed eviction
    pub fn record_eviction_failure(&self, strategy: &str, node: &str) {
        self.eviction_failures_total
            .get_or_create(&EvictionLabels::new(strategy, node))
            .inc();
    }

    /// Record the saturated owner count of the latest analysis
    pub fn set_saturated_owners(&self, count: usize) {
        self.saturated_owners
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record a completed pass
    pub fn record_pass(&self, duration_secs: f64) {
        self.passes_total.inc();
        self.pass_duration_seconds.observe(duration_secs);
    }

    /// Record a pass that could not run
    pub fn record_pass_error(&self) {
        self.pass_errors_total.inc();
    }

    /// Encode metrics to Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if encode(&mut buffer, &self.registry).is_err() {
            tracing::error!("Failed to encode metrics");
            return "# Error encoding metrics".to_string();
        }
        buffer
    }
}

/// Shared state for the health server
pub struct HealthState {
    /// Whether passes are being scheduled (leadership held, loop running)
    ready: RwLock<bool>,
    /// Metrics registry
    pub metrics: Metrics,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (starts as not ready)
    pub fn new() -> Self {
        Self {
            ready: RwLock::new(false),
            metrics: Metrics::new(),
        }
    }

    /// Mark the descheduler as ready or not ready
    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    /// Check if the descheduler is ready
    pub async fn is_ready(&self) -> bool {
        *self.ready.read().await
    }
}

/// Liveness probe handler
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe handler
///
/// Returns 503 Service Unavailable until the pass loop is running.
async fn readyz(State(state): State<Arc<HealthState>>) -> Response {
    if state.is_ready().await {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

/// Metrics handler
async fn metrics_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let body = state.metrics.encode();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Create the health server router
pub fn create_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Run the health server on 0.0.0.0:8080
pub async fn run_health_server(state: Arc<HealthState>) -> Result<(), std::io::Error> {
    let app = create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], HEALTH_PORT));
    info!(port = HEALTH_PORT, "Starting health server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
