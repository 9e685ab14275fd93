//! Oracle daemon entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use oracle_adapters::{AdapterMetrics, FetchContext};
use oracle_aggregator::{AggregatorMetrics, DataAggregator};
use oracle_certs::CertificateManager;
use oracle_config::{OracleConfig, ReportStrategy};
use oracle_reporter::reporter::{run_block_based, run_timer_based, BlockInfo, BlockSource, Reporter};
use oracle_reporter::{NullChainClient, ReporterMetrics};
use prometheus::Registry;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("oracle_daemon=info".parse()?)
                .add_directive("oracle_aggregator=info".parse()?)
                .add_directive("oracle_reporter=info".parse()?)
                .add_directive("oracle_adapters=info".parse()?),
        )
        .init();

    info!("starting price oracle daemon");

    let config = OracleConfig::from_env().context("failed to load oracle configuration")?;
    info!(
        pair = ?config.currency_pair,
        strategy = ?config.report_strategy,
        sources = config.price_sources.len(),
        "configuration loaded"
    );

    let registry = Registry::new();
    let adapter_metrics = Arc::new(AdapterMetrics::new(&registry));
    let aggregator_metrics = Arc::new(AggregatorMetrics::new(&registry));
    let reporter_metrics = Arc::new(ReporterMetrics::new(&registry));

    // Certificate fingerprint distribution is an external collaborator
    // (spec §1); we only seed and, if configured, periodically refresh from
    // it — the service providing the mapping itself is out of scope.
    let mut certs = CertificateManager::seeded();
    if let Some(url) = config.cert_refresh_url.clone() {
        certs = certs.with_refresh(url, config.cert_refresh_interval);
    }
    let certs = Arc::new(certs);

    let fetch_ctx = Arc::new(FetchContext::new(
        certs.clone(),
        adapter_metrics.clone(),
        Duration::from_millis(config.api_request_timeout_ms),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let aggregator = Arc::new(
        DataAggregator::spawn(&config, fetch_ctx.clone(), aggregator_metrics, shutdown_rx.clone())
            .context("failed to spawn data aggregator")?,
    );
    info!(sources = aggregator.source_count(), "data aggregator running");

    spawn_cert_refresh_loop(certs, config.cert_refresh_interval, shutdown_rx.clone());

    // Wallet signing and the RPC/chain-client binding are both out of scope
    // (spec §1); `NullChainClient` is the placeholder every report is routed
    // through until a real binding is wired in at deploy time.
    let chain_client = Arc::new(NullChainClient);
    let reporter = Arc::new(Reporter::new(&config, aggregator, chain_client, reporter_metrics));

    let reporter_task = match config.report_strategy {
        ReportStrategy::TimerBased => tokio::spawn(run_timer_based(
            reporter,
            config.report_frequency_ms,
            config.report_offset_ms,
            config.report_minimum_ms,
            config.remove_expired_frequency_ms,
            shutdown_rx.clone(),
        )),
        ReportStrategy::BlockBased => tokio::spawn(run_block_based(
            reporter,
            Box::new(PollingBlockSource::new(Duration::from_millis(config.fetch_frequency_ms))),
            config.remove_expired_frequency_ms,
            shutdown_rx.clone(),
        )),
    };

    info!("oracle daemon running, press Ctrl+C to stop");
    signal::ctrl_c().await.context("failed to listen for shutdown signal")?;

    info!("shutdown signal received, draining in-flight work");
    let _ = shutdown_tx.send(true);
    let _ = reporter_task.await;

    info!("oracle daemon stopped");
    Ok(())
}

fn spawn_cert_refresh_loop(
    certs: Arc<CertificateManager>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => certs.refresh().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    });
}

/// Polls `ChainClient::latest_block_timestamp_ms` on a fixed cadence and
/// surfaces each poll as a synthetic block arrival. A real binding would
/// subscribe to the chain's websocket block feed instead (spec §1 marks the
/// blockchain client library binding itself out of scope).
struct PollingBlockSource {
    interval: tokio::time::Interval,
    block_number: u64,
}

impl PollingBlockSource {
    fn new(period: Duration) -> Self {
        Self {
            interval: tokio::time::interval(period),
            block_number: 0,
        }
    }
}

#[async_trait::async_trait]
impl BlockSource for PollingBlockSource {
    async fn next_block(&mut self) -> Option<BlockInfo> {
        self.interval.tick().await;
        self.block_number += 1;
        Some(BlockInfo {
            number: self.block_number,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        })
    }
}
