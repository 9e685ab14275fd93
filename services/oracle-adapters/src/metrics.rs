use std::time::Duration;

use oracle_types::Exchange;
use prometheus::{HistogramVec, IntCounterVec, Registry};

/// Prometheus counters/histograms for the fetch pipeline, one instance shared
/// across all adapters.
pub struct AdapterMetrics {
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
}

impl AdapterMetrics {
    pub fn new(registry: &Registry) -> Self {
        let requests_total = IntCounterVec::new(
            prometheus::Opts::new(
                "oracle_adapter_requests_total",
                "Outbound adapter requests by venue and outcome",
            ),
            &["exchange", "outcome"],
        )
        .expect("static metric descriptor is valid");

        let request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "oracle_adapter_request_duration_seconds",
                "Adapter fetch-ticker request duration",
            ),
            &["exchange"],
        )
        .expect("static metric descriptor is valid");

        registry
            .register(Box::new(requests_total.clone()))
            .expect("metric registered exactly once");
        registry
            .register(Box::new(request_duration_seconds.clone()))
            .expect("metric registered exactly once");

        Self {
            requests_total,
            request_duration_seconds,
        }
    }

    pub fn record_outcome(&self, exchange: Exchange, outcome: &str, duration: Duration) {
        self.requests_total
            .with_label_values(&[exchange.as_str(), outcome])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[exchange.as_str()])
            .observe(duration.as_secs_f64());
    }
}
