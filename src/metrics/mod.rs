//! Metrics for the registration service
//!
//! Each area of the service defines its metrics in a dedicated submodule so
//! names stay consistent and conflicts are caught at registration time.

pub mod admin;
pub mod registration;

pub use admin::AdminMetrics;
pub use registration::RegistrationMetrics;

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::{Once, OnceLock};
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and register every metric.
///
/// Idempotent. The recorder is scraped in-process through [`render`], which
/// the HTTP server exposes on `/metrics`.
pub fn init_metrics() {
    INIT.call_once(|| {
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("Prometheus handle was already stored");
                }
                RegistrationMetrics::register_metrics();
                AdminMetrics::register_metrics();
                info!("Prometheus recorder installed and registration metrics registered");
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
            }
        }
    });
}

/// Current metrics in Prometheus text format, if the recorder is installed
pub fn render() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

/// Trait for area-specific metric collections
pub trait AreaMetrics {
    /// Describe every metric of this area to the recorder
    fn register_metrics();

    /// Area name used as the metric name infix
    fn area_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Metric names follow `spardha_{area}_{name}[_total]`
macro_rules! area_metric {
    (counter, $area:literal, $name:literal) => {
        concat!("spardha_", $area, "_", $name, "_total")
    };
    (histogram, $area:literal, $name:literal) => {
        concat!("spardha_", $area, "_", $name)
    };
}

pub(crate) use area_metric;
