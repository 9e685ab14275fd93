//! The Price Source Loop (spec §4.2): one task per configured price source,
//! polling every leg's adapter on a fixed cadence and publishing the
//! combined observation for the aggregator to read.
//!
//! Each task owns a private `WindowedBuffer` (monotonicity + eviction) and
//! mirrors `oracle_certs::CertificateManager`'s pattern of publishing only
//! the latest value through an `ArcSwap` cell, so the aggregator's snapshot
//! read never contends with the writer.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use oracle_adapters::{fetch_ticker, ExchangeAdapter, FetchContext};
use oracle_types::{LegValue, Observation, PriceSourceConfig, WindowedBuffer};
use tracing::{debug, warn};

/// The latest published observation for one price source, read lock-free by
/// the aggregator. `None` until the first successful tick.
pub struct PublishedObservation {
    cell: ArcSwap<Option<Observation>>,
}

impl PublishedObservation {
    pub fn new() -> Self {
        Self {
            cell: ArcSwap::from_pointee(None),
        }
    }

    pub fn latest(&self) -> Option<Observation> {
        *self.cell.load_full()
    }

    fn publish(&self, observation: Observation) {
        self.cell.store(Arc::new(Some(observation)));
    }
}

impl Default for PublishedObservation {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one price source's poll loop until `shutdown` fires. Returns only on
/// cancellation; per-tick failures are logged and skipped rather than
/// propagated, since one bad tick must never take down the process.
pub async fn run(
    source: PriceSourceConfig,
    adapters: Vec<Arc<dyn ExchangeAdapter>>,
    ctx: Arc<FetchContext>,
    published: Arc<PublishedObservation>,
    fetch_frequency: Duration,
    window_duration_ms: i64,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    assert_eq!(
        adapters.len(),
        source.legs.len(),
        "one adapter must be supplied per leg, in leg order"
    );

    let mut buffer = WindowedBuffer::new(window_duration_ms);
    let mut ticker = tokio::time::interval(fetch_frequency);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!(source = %source.display_name(), "price source loop shutting down");
                    return;
                }
            }
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        match fetch_one_tick(&source, &adapters, &ctx, now_ms).await {
            Ok(observation) => {
                buffer.insert(observation);
                published.publish(observation);
            }
            Err(err) => {
                warn!(source = %source.display_name(), error = %err, "price source tick failed");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceTickError {
    #[error("leg {exchange} failed: {source}")]
    LegFetch {
        exchange: oracle_types::Exchange,
        #[source]
        source: oracle_adapters::AdapterError,
    },
    #[error(transparent)]
    Combine(#[from] oracle_types::price_source::PriceSourceConfigError),
}

async fn fetch_one_tick(
    source: &PriceSourceConfig,
    adapters: &[Arc<dyn ExchangeAdapter>],
    ctx: &FetchContext,
    now_ms: i64,
) -> Result<Observation, SourceTickError> {
    let mut leg_values = Vec::with_capacity(source.legs.len());
    for (leg, adapter) in source.legs.iter().zip(adapters.iter()) {
        let ticker = fetch_ticker(adapter.as_ref(), ctx, leg.pair, now_ms)
            .await
            .map_err(|source| SourceTickError::LegFetch {
                exchange: leg.exchange,
                source,
            })?;
        leg_values.push(LegValue {
            mid: ticker.mid_price(),
            bid: ticker.bid,
            ask: ticker.ask,
            last_price: ticker.last_price,
            base_volume: ticker.base_volume,
        });
    }

    let tick = source.combine_legs(&leg_values)?;
    Ok(Observation {
        timestamp_ms: now_ms,
        mid: tick.mid,
        ask: tick.ask,
        bid: tick.bid,
        last_price: tick.last_price,
        volume: tick.volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_published_observation_starts_empty() {
        let published = PublishedObservation::new();
        assert!(published.latest().is_none());
    }

    #[test]
    fn publish_then_latest_round_trips() {
        let published = PublishedObservation::new();
        let obs = Observation {
            timestamp_ms: 1_000,
            mid: rust_decimal::Decimal::ONE,
            ask: rust_decimal::Decimal::ONE,
            bid: rust_decimal::Decimal::ONE,
            last_price: rust_decimal::Decimal::ONE,
            volume: rust_decimal::Decimal::ONE,
        };
        published.publish(obs);
        assert_eq!(published.latest(), Some(obs));
    }
}
