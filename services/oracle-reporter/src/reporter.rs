//! The Reporter state machine (spec §4.4):
//!
//! ```text
//! Idle ──tick──► Evaluating ──valid&passes──► Submitting ──ok──► Idle
//!                      │                           │──err,n<limit──► backoff ──► Submitting
//!                      │                           └──err,n=limit──► Idle (metric: tx_fail)
//!                      └──breaker-trip──► Breakered ──cooldown──► Idle
//! ```
//!
//! `submit_with_retry` (see `retry`) already owns the inner
//! `Submitting ⇄ backoff` loop, so the state observed from outside this
//! module only ever needs `Idle`/`Evaluating`/`Breakered` — the backoff
//! sub-states are an implementation detail of one `Submitting` call.

use std::sync::Arc;
use std::time::Duration;

use oracle_aggregator::DataAggregator;
use oracle_config::OracleConfig;
use oracle_types::{AggregatedPrice, ReportedPair};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::chain_client::{ChainClient, ReportSubmission};
use crate::circuit_breaker::{self, CircuitBreakerParams, CircuitBreakerState, Decision, SuppressReason};
use crate::metrics::ReporterMetrics;
use crate::retry::{self, RetryParams};
use crate::scheduler::{self, BlockBasedParams, LastReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Idle,
    Evaluating,
    Breakered,
}

/// The outcome of one `tick`, mostly useful for tests and logging — the
/// real side effects (submission, metric emission, state transition)
/// already happened by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    NoAggregate,
    Suppressed(SuppressReason),
    Tripped,
    Submitted,
    SubmissionFailed,
}

struct ReporterInner {
    state: ReporterState,
    circuit_breaker: CircuitBreakerState,
    last_report: Option<LastReport>,
}

/// Ties the aggregator snapshot, circuit breaker, and chain client together.
/// Holds only an `Arc<DataAggregator>` (spec §3: "the reporter holds a weak
/// reference to the aggregator, observe-only") — nothing here ever mutates
/// aggregator state, only reads `current_price`.
pub struct Reporter {
    aggregator: Arc<DataAggregator>,
    chain_client: Arc<dyn ChainClient>,
    pair: ReportedPair,
    circuit_breaker_params: CircuitBreakerParams,
    retry_params: RetryParams,
    block_params: BlockBasedParams,
    price_decimals: u32,
    metrics: Arc<ReporterMetrics>,
    inner: Mutex<ReporterInner>,
}

impl Reporter {
    pub fn new(
        config: &OracleConfig,
        aggregator: Arc<DataAggregator>,
        chain_client: Arc<dyn ChainClient>,
        metrics: Arc<ReporterMetrics>,
    ) -> Self {
        Self {
            aggregator,
            chain_client,
            pair: config.currency_pair,
            circuit_breaker_params: CircuitBreakerParams {
                threshold_min: config.circuit_breaker_price_change_threshold_min,
                threshold_max: config.circuit_breaker_price_change_threshold_max,
                time_multiplier: config.circuit_breaker_price_change_threshold_time_multiplier,
                duration_ms: config.circuit_breaker_duration_ms,
            },
            retry_params: RetryParams {
                retry_limit: config.transaction_retry_limit,
                gas_price_multiplier_step: config.transaction_retry_gas_price_multiplier,
                gas_price_multiplier_cap: config.gas_price_multiplier_cap,
                base_backoff: Duration::from_millis(500),
                max_backoff: Duration::from_secs(30),
            },
            block_params: BlockBasedParams {
                max_block_timestamp_age_ms: config.max_block_timestamp_age_ms,
                target_max_heartbeat_period_ms: config.target_max_heartbeat_period_ms as i64,
                min_report_price_change_threshold: config.min_report_price_change_threshold,
            },
            price_decimals: 18,
            metrics,
            inner: Mutex::new(ReporterInner {
                state: ReporterState::Idle,
                circuit_breaker: CircuitBreakerState::Enabled,
                last_report: None,
            }),
        }
    }

    pub async fn state(&self) -> ReporterState {
        self.inner.lock().await.state
    }

    /// An operator-triggered re-arm (spec §9 REDESIGN FLAGS): unlocks the
    /// breaker immediately regardless of the automatic cooldown timer.
    pub async fn rearm_circuit_breaker(&self) {
        let mut inner = self.inner.lock().await;
        inner.circuit_breaker = circuit_breaker::rearm();
        inner.state = ReporterState::Idle;
    }

    /// Evaluates the aggregator's current price and, if it passes the
    /// circuit breaker, submits it. Drives exactly one `Idle -> ... -> Idle`
    /// cycle of the state machine.
    pub async fn tick(&self, now_ms: i64) -> TickOutcome {
        {
            let mut inner = self.inner.lock().await;
            inner.state = ReporterState::Evaluating;
        }

        let aggregated = match self.aggregator.current_price(now_ms) {
            Ok(price) => price,
            Err(err) => {
                debug!(%err, "no aggregate available this tick");
                self.metrics.record_report_outcome("no_aggregate");
                self.set_idle().await;
                return TickOutcome::NoAggregate;
            }
        };

        let last_reported_value = {
            let inner = self.inner.lock().await;
            inner.last_report.map(|r| r.value).unwrap_or(Decimal::ZERO)
        };

        let cb_state = self.inner.lock().await.circuit_breaker;
        let (decision, next_cb_state) = circuit_breaker::evaluate(
            cb_state,
            last_reported_value,
            aggregated.value,
            now_ms,
            &self.circuit_breaker_params,
        );

        match decision {
            Decision::Suppressed(reason) => {
                self.metrics.record_report_outcome("suppressed");
                let mut inner = self.inner.lock().await;
                inner.circuit_breaker = next_cb_state;
                inner.state = ReporterState::Breakered;
                TickOutcome::Suppressed(reason)
            }
            Decision::Trip => {
                warn!(value = %aggregated.value, "circuit breaker tripped, report withheld");
                self.metrics.record_report_outcome("tripped");
                self.metrics.record_circuit_breaker_transition("tripped");
                let mut inner = self.inner.lock().await;
                inner.circuit_breaker = next_cb_state;
                inner.state = ReporterState::Breakered;
                TickOutcome::Tripped
            }
            Decision::Submit { .. } => {
                let outcome = self.submit(&aggregated, now_ms).await;
                let mut inner = self.inner.lock().await;
                inner.circuit_breaker = next_cb_state;
                inner.state = ReporterState::Idle;
                if outcome == TickOutcome::Submitted {
                    inner.last_report = Some(LastReport { value: aggregated.value, reported_at_ms: now_ms });
                }
                outcome
            }
        }
    }

    async fn set_idle(&self) {
        self.inner.lock().await.state = ReporterState::Idle;
    }

    async fn submit(&self, aggregated: &AggregatedPrice, now_ms: i64) -> TickOutcome {
        let denominator: u128 = 10u128.pow(self.price_decimals);
        let denominator_dec = Decimal::from(10u64.pow(self.price_decimals));
        let numerator = (aggregated.value * denominator_dec)
            .round()
            .to_u128()
            .unwrap_or(0);

        let neighbors = match self.chain_client.find_neighbors(self.pair, aggregated.value).await {
            Ok(n) => n,
            Err(err) => {
                error!(%err, "failed to look up sorted-oracle neighbors");
                self.metrics.record_report_outcome("tx_fail");
                return TickOutcome::SubmissionFailed;
            }
        };

        let submission = ReportSubmission {
            reporter: "self".to_string(),
            pair: self.pair,
            numerator,
            denominator,
            lesser_neighbors: neighbors.lesser,
            greater_neighbors: neighbors.greater,
        };

        match retry::submit_with_retry(self.chain_client.as_ref(), &submission, &self.retry_params).await {
            Ok(()) => {
                info!(value = %aggregated.value, timestamp_ms = now_ms, "submitted report");
                self.metrics.record_report_outcome("success");
                TickOutcome::Submitted
            }
            Err(err) => {
                error!(%err, "report submission exhausted retries");
                self.metrics.record_report_outcome("tx_fail");
                TickOutcome::SubmissionFailed
            }
        }
    }

    /// Removes this pair's expired on-chain reports (spec §4.4 timer-based
    /// strategy's separate `removeExpired` cadence).
    pub async fn remove_expired(&self) {
        if let Err(err) = self.chain_client.remove_expired(self.pair).await {
            warn!(%err, "remove-expired call failed");
        }
    }
}

/// Drives the timer-based scheduling strategy (spec §4.4): fires `tick` on
/// the aligned cadence, and `remove_expired` on its own separate cadence.
pub async fn run_timer_based(
    reporter: Arc<Reporter>,
    frequency_ms: u64,
    offset_ms: u64,
    minimum_ms: u64,
    remove_expired_frequency_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut remove_expired_interval = tokio::time::interval(Duration::from_millis(remove_expired_frequency_ms));

    loop {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let delay_ms = scheduler::ms_to_next_action(
            now_ms,
            frequency_ms as i64,
            offset_ms as i64,
            minimum_ms as i64,
        );

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay_ms.max(0) as u64)) => {
                let fire_ms = chrono::Utc::now().timestamp_millis();
                reporter.tick(fire_ms).await;
            }
            _ = remove_expired_interval.tick() => {
                reporter.remove_expired().await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!("reporter timer loop shutting down");
                    return;
                }
            }
        }
    }
}

/// Minimal block-arrival source; a real implementation subscribes to the
/// chain client's websocket provider (explicitly out of scope per spec §1).
#[async_trait::async_trait]
pub trait BlockSource: Send + Sync {
    async fn next_block(&mut self) -> Option<BlockInfo>;
}

#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp_ms: i64,
}

/// Drives the block-based scheduling strategy (spec §4.4): at most one
/// report per block, gated by `scheduler::should_report_on_block`.
pub async fn run_block_based(
    reporter: Arc<Reporter>,
    mut blocks: Box<dyn BlockSource>,
    remove_expired_frequency_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let block_params = reporter.block_params;

    let mut remove_expired_interval = tokio::time::interval(Duration::from_millis(remove_expired_frequency_ms));

    loop {
        tokio::select! {
            block = blocks.next_block() => {
                let Some(block) = block else {
                    debug!("block source closed, reporter block-based loop ending");
                    return;
                };
                let now_ms = chrono::Utc::now().timestamp_millis();
                let Ok(aggregated) = reporter.aggregator.current_price(now_ms) else {
                    continue;
                };
                let last_report = reporter.inner.lock().await.last_report;
                if scheduler::should_report_on_block(
                    block.timestamp_ms,
                    now_ms,
                    aggregated.value,
                    last_report,
                    &block_params,
                ) {
                    reporter.tick(now_ms).await;
                }
            }
            _ = remove_expired_interval.tick() => {
                reporter.remove_expired().await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!("reporter block-based loop shutting down");
                    return;
                }
            }
        }
    }
}
