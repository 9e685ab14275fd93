use prometheus::{IntCounterVec, Registry};

/// Prometheus counters for report attempts/outcomes and circuit-breaker
/// state transitions (spec §6.3).
pub struct ReporterMetrics {
    report_attempts_total: IntCounterVec,
    circuit_breaker_transitions_total: IntCounterVec,
}

impl ReporterMetrics {
    pub fn new(registry: &Registry) -> Self {
        let report_attempts_total = IntCounterVec::new(
            prometheus::Opts::new(
                "oracle_report_attempts_total",
                "Reporter submission attempts by outcome",
            ),
            &["outcome"],
        )
        .expect("static metric descriptor is valid");

        let circuit_breaker_transitions_total = IntCounterVec::new(
            prometheus::Opts::new(
                "oracle_circuit_breaker_transitions_total",
                "Circuit breaker state transitions",
            ),
            &["to_state"],
        )
        .expect("static metric descriptor is valid");

        registry
            .register(Box::new(report_attempts_total.clone()))
            .expect("metric registered exactly once");
        registry
            .register(Box::new(circuit_breaker_transitions_total.clone()))
            .expect("metric registered exactly once");

        Self {
            report_attempts_total,
            circuit_breaker_transitions_total,
        }
    }

    pub fn record_report_outcome(&self, outcome: &'static str) {
        self.report_attempts_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_circuit_breaker_transition(&self, to_state: &'static str) {
        self.circuit_breaker_transitions_total
            .with_label_values(&[to_state])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_without_panicking() {
        let registry = Registry::new();
        let metrics = ReporterMetrics::new(&registry);
        metrics.record_report_outcome("success");
        metrics.record_circuit_breaker_transition("tripped");
        assert!(!registry.gather().is_empty());
    }
}
