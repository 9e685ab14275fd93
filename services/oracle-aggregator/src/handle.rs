//! Wires the registry and price-source loop into the "Data Aggregator" of
//! spec §4.3: owns every configured source's publication cell and answers
//! `current_price` from one atomic snapshot across all of them, so the
//! reporter never observes a partially updated aggregate (spec §5).

use std::sync::Arc;
use std::time::Duration;

use oracle_adapters::FetchContext;
use oracle_config::OracleConfig;
use oracle_types::{AggregatedPrice, Exchange};
use tokio::sync::watch;
use tracing::info;

use crate::aggregator::{aggregate, AggregationParams, SourceSnapshot};
use crate::error::Result;
use crate::metrics::AggregatorMetrics;
use crate::registry::{self, RegistryError};
use crate::source_task::{self, PublishedObservation};

#[derive(Debug, thiserror::Error)]
pub enum DataAggregatorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

struct LiveSource {
    /// The venue used to label this source's contribution in metrics and
    /// `AggregatedPrice::per_source_weights` — the first leg's exchange for
    /// multi-leg sources (spec §4.3's `SourceSnapshot.exchange`).
    representative_exchange: Exchange,
    published: Arc<PublishedObservation>,
}

/// The aggregator exclusively owns all price-source buffers (spec §3
/// ownership note): every `WindowedBuffer` lives inside the spawned
/// `source_task::run` task, reachable only through this handle's
/// `published` cells.
pub struct DataAggregator {
    sources: Vec<LiveSource>,
    params: AggregationParams,
    method: oracle_config::AggregationMethod,
    metrics: Arc<AggregatorMetrics>,
}

impl DataAggregator {
    /// Spawns one poll task per `config.price_sources` entry and returns the
    /// handle the reporter reads from. Each spawned task shares the same
    /// `shutdown` receiver so a single broadcast ends every source loop.
    pub fn spawn(
        config: &OracleConfig,
        ctx: Arc<FetchContext>,
        metrics: Arc<AggregatorMetrics>,
        shutdown: watch::Receiver<bool>,
    ) -> std::result::Result<Self, DataAggregatorError> {
        let adapters = registry::build_registry(config)?;

        let mut sources = Vec::with_capacity(config.price_sources.len());
        for source in &config.price_sources {
            let leg_adapters = source
                .legs
                .iter()
                .map(|leg| {
                    adapters
                        .get(&leg.exchange)
                        .cloned()
                        .expect("registry is built from the same price_sources config")
                })
                .collect::<Vec<_>>();

            let published = Arc::new(PublishedObservation::new());
            let representative_exchange = source.legs[0].exchange;

            info!(source = %source.display_name(), "spawning price source loop");
            tokio::spawn(source_task::run(
                source.clone(),
                leg_adapters,
                ctx.clone(),
                published.clone(),
                Duration::from_millis(config.fetch_frequency_ms),
                config.aggregation_window_duration_ms,
                shutdown.clone(),
            ));

            sources.push(LiveSource {
                representative_exchange,
                published,
            });
        }

        Ok(Self {
            sources,
            params: AggregationParams {
                max_percentage_bid_ask_spread: config.max_percentage_bid_ask_spread,
                max_percentage_deviation: config.max_percentage_deviation,
                max_source_weight_share: config.max_source_weight_share,
                min_price_source_count: config.minimum_price_sources,
                min_aggregated_volume: config.min_aggregated_volume,
                max_no_trade_duration_ms: config.max_no_trade_duration_ms,
            },
            method: config.aggregation_method,
            metrics,
        })
    }

    /// Snapshots every source's latest observation and combines them into
    /// one `AggregatedPrice`. The snapshot barrier is just reading each
    /// `ArcSwap` cell up front — there's no lock, so no suspension point is
    /// ever held across the read (spec §5).
    pub fn current_price(&self, now_ms: i64) -> Result<AggregatedPrice> {
        let snapshots: Vec<SourceSnapshot> = self
            .sources
            .iter()
            .filter_map(|s| {
                s.published.latest().map(|observation| SourceSnapshot {
                    exchange: s.representative_exchange,
                    observation,
                })
            })
            .collect();

        let result = aggregate(&snapshots, self.method, &self.params, now_ms);
        self.metrics.record_outcome(&result);
        result
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}
