//! Submission metrics
//!
//! Counts accepted and rejected registrations and how long a submission
//! takes from normalization to the final write.

use crate::error::ErrorKind;
use crate::metrics::{area_metric, AreaMetrics, MetricDoc, MetricType};

pub struct RegistrationMetrics;

impl RegistrationMetrics {
    pub fn record_accepted(duration_secs: f64) {
        ::metrics::counter!(area_metric!(counter, "registration", "submissions_accepted")).increment(1);
        ::metrics::histogram!(area_metric!(
            histogram,
            "registration",
            "submission_duration_seconds"
        ))
        .record(duration_secs);
    }

    /// One increment per rejected submission, labelled with each failing kind
    pub fn record_rejected(kinds: &[ErrorKind]) {
        ::metrics::counter!(area_metric!(counter, "registration", "submissions_rejected")).increment(1);
        for kind in kinds {
            ::metrics::counter!(
                area_metric!(counter, "registration", "field_errors"),
                "kind" => kind.as_str()
            )
            .increment(1);
        }
    }

    /// A duplicate caught by the store after the lookup had passed
    pub fn record_write_time_duplicate() {
        ::metrics::counter!(area_metric!(counter, "registration", "write_time_duplicates")).increment(1);
    }
}

impl AreaMetrics for RegistrationMetrics {
    fn register_metrics() {
        use metrics::{describe_counter, describe_histogram};

        describe_counter!(
            area_metric!(counter, "registration", "submissions_accepted"),
            "Total number of registrations accepted and stored"
        );
        describe_counter!(
            area_metric!(counter, "registration", "submissions_rejected"),
            "Total number of submissions rejected by validation"
        );
        describe_counter!(
            area_metric!(counter, "registration", "field_errors"),
            "Field errors reported to submitters, by error kind"
        );
        describe_counter!(
            area_metric!(counter, "registration", "write_time_duplicates"),
            "Duplicate emails rejected by the store after passing the lookup"
        );
        describe_histogram!(
            area_metric!(histogram, "registration", "submission_duration_seconds"),
            "Time from receiving a submission to storing it"
        );
    }

    fn area_name() -> &'static str {
        "registration"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: area_metric!(counter, "registration", "submissions_accepted"),
                metric_type: MetricType::Counter,
                help: "Total number of registrations accepted and stored",
                labels: vec![],
            },
            MetricDoc {
                name: area_metric!(counter, "registration", "submissions_rejected"),
                metric_type: MetricType::Counter,
                help: "Total number of submissions rejected by validation",
                labels: vec![],
            },
            MetricDoc {
                name: area_metric!(counter, "registration", "field_errors"),
                metric_type: MetricType::Counter,
                help: "Field errors reported to submitters, by error kind",
                labels: vec!["kind"],
            },
            MetricDoc {
                name: area_metric!(counter, "registration", "write_time_duplicates"),
                metric_type: MetricType::Counter,
                help: "Duplicate emails rejected by the store after passing the lookup",
                labels: vec![],
            },
            MetricDoc {
                name: area_metric!(histogram, "registration", "submission_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time from receiving a submission to storing it",
                labels: vec![],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_metrics_registration() {
        RegistrationMetrics::register_metrics();
        // Recording must not depend on a recorder being installed
        RegistrationMetrics::record_rejected(&[ErrorKind::PartnerMismatch]);
    }

    #[test]
    fn test_metrics_documentation() {
        let docs = RegistrationMetrics::metrics_documentation();
        assert_eq!(docs.len(), 5);
        for doc in docs {
            assert!(doc.name.starts_with("spardha_registration_"));
        }
        assert_eq!(RegistrationMetrics::area_name(), "registration");
    }
}
