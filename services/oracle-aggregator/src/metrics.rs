use prometheus::{IntCounterVec, Registry};

use crate::error::AggregatorError;

/// Prometheus counters for aggregation outcomes, mirroring the labelling
/// style of `oracle_adapters::AdapterMetrics`.
pub struct AggregatorMetrics {
    outcomes_total: IntCounterVec,
}

impl AggregatorMetrics {
    pub fn new(registry: &Registry) -> Self {
        let outcomes_total = IntCounterVec::new(
            prometheus::Opts::new(
                "oracle_aggregation_outcomes_total",
                "Aggregation pass outcomes by result category",
            ),
            &["outcome"],
        )
        .expect("static metric descriptor is valid");

        registry
            .register(Box::new(outcomes_total.clone()))
            .expect("metric registered exactly once");

        Self { outcomes_total }
    }

    pub fn record_outcome(&self, result: &crate::error::Result<oracle_types::AggregatedPrice>) {
        let label = match result {
            Ok(_) => "success",
            Err(AggregatorError::InsufficientSources { .. }) => "insufficient_sources",
            Err(AggregatorError::InsufficientVolume { .. }) => "insufficient_volume",
        };
        self.outcomes_total.with_label_values(&[label]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn records_both_success_and_failure_outcomes_without_panicking() {
        let registry = Registry::new();
        let metrics = AggregatorMetrics::new(&registry);
        let ok: crate::error::Result<oracle_types::AggregatedPrice> = Ok(oracle_types::AggregatedPrice {
            value: dec!(1),
            timestamp_ms: 0,
            contributing_source_count: 1,
            per_source_weights: vec![],
        });
        let err: crate::error::Result<oracle_types::AggregatedPrice> =
            Err(AggregatorError::InsufficientSources { required: 2, found: 1 });
        metrics.record_outcome(&ok);
        metrics.record_outcome(&err);
        assert!(!registry.gather().is_empty());
    }
}
