use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::exchange::Exchange;

/// The result of one aggregation pass: a single cross-source price plus
/// enough provenance for metrics and the reporter's circuit-breaker checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPrice {
    pub value: Decimal,
    pub timestamp_ms: i64,
    pub contributing_source_count: usize,
    pub per_source_weights: Vec<(Exchange, Decimal)>,
}

impl AggregatedPrice {
    pub fn total_weight(&self) -> Decimal {
        self.per_source_weights
            .iter()
            .map(|(_, w)| *w)
            .fold(Decimal::ZERO, |acc, w| acc + w)
    }
}
