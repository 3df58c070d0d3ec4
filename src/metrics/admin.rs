//! Administrative metrics: updates, deletions and roster exports

use crate::metrics::{area_metric, AreaMetrics, MetricDoc, MetricType};

pub struct AdminMetrics;

impl AdminMetrics {
    pub fn record_update() {
        ::metrics::counter!(area_metric!(counter, "admin", "updates")).increment(1);
    }

    pub fn record_delete() {
        ::metrics::counter!(area_metric!(counter, "admin", "deletes")).increment(1);
    }

    pub fn record_export(registrations: usize) {
        ::metrics::counter!(area_metric!(counter, "admin", "exports")).increment(1);
        ::metrics::histogram!(area_metric!(histogram, "admin", "export_registrations"))
            .record(registrations as f64);
    }
}

impl AreaMetrics for AdminMetrics {
    fn register_metrics() {
        use metrics::{describe_counter, describe_histogram};

        describe_counter!(
            area_metric!(counter, "admin", "updates"),
            "Total number of registrations edited by administrators"
        );
        describe_counter!(
            area_metric!(counter, "admin", "deletes"),
            "Total number of registrations deleted by administrators"
        );
        describe_counter!(
            area_metric!(counter, "admin", "exports"),
            "Total number of roster exports"
        );
        describe_histogram!(
            area_metric!(histogram, "admin", "export_registrations"),
            "Registrations included per roster export"
        );
    }

    fn area_name() -> &'static str {
        "admin"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: area_metric!(counter, "admin", "updates"),
                metric_type: MetricType::Counter,
                help: "Total number of registrations edited by administrators",
                labels: vec![],
            },
            MetricDoc {
                name: area_metric!(counter, "admin", "deletes"),
                metric_type: MetricType::Counter,
                help: "Total number of registrations deleted by administrators",
                labels: vec![],
            },
            MetricDoc {
                name: area_metric!(counter, "admin", "exports"),
                metric_type: MetricType::Counter,
                help: "Total number of roster exports",
                labels: vec![],
            },
            MetricDoc {
                name: area_metric!(histogram, "admin", "export_registrations"),
                metric_type: MetricType::Histogram,
                help: "Registrations included per roster export",
                labels: vec![],
            },
        ]
    }
}
