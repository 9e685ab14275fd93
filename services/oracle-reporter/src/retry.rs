//! Gas-priced transaction retry (spec §4.4): on submission failure, retry up
//! to `transaction_retry_limit` times, multiplying the effective gas price
//! by `(1 + transaction_retry_gas_price_multiplier)` per attempt (capped by
//! `gas_price_multiplier_cap`), with exponential backoff and capped jitter
//! between attempts.

use std::time::Duration;

use rand::Rng;
use rust_decimal::Decimal;
use tracing::warn;

use crate::chain_client::{ChainClient, ChainClientError, ReportSubmission};
use crate::error::{ReporterError, Result};

#[derive(Debug, Clone, Copy)]
pub struct RetryParams {
    pub retry_limit: u32,
    pub gas_price_multiplier_step: Decimal,
    pub gas_price_multiplier_cap: Decimal,
    /// Base backoff, doubled per attempt and capped by `max_backoff`.
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

/// The gas price multiplier applied on attempt `attempt` (0-indexed):
/// `1.0` on the first attempt, growing by `(1 + step)` per retry, capped.
pub fn gas_price_multiplier_for_attempt(attempt: u32, params: &RetryParams) -> Decimal {
    let mut multiplier = Decimal::ONE;
    for _ in 0..attempt {
        multiplier = (multiplier * (Decimal::ONE + params.gas_price_multiplier_step))
            .min(params.gas_price_multiplier_cap);
    }
    multiplier
}

/// Exponential backoff doubling `base_backoff` per attempt, capped at
/// `max_backoff`, with up to 20% jitter layered on top so concurrently
/// retrying reporters don't all resubmit in lockstep.
fn backoff_for_attempt(attempt: u32, params: &RetryParams) -> Duration {
    let doubled = params.base_backoff.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    let capped = doubled.min(params.max_backoff);
    let jitter_fraction: f64 = rand::thread_rng().gen_range(0.0..0.2);
    capped.mul_f64(1.0 + jitter_fraction)
}

/// Runs the submission retry loop to completion: on success returns `Ok(())`;
/// on exhausting `retry_limit` attempts returns `SubmissionFailed` carrying
/// the last error.
pub async fn submit_with_retry(
    client: &dyn ChainClient,
    submission: &ReportSubmission,
    params: &RetryParams,
) -> Result<()> {
    let mut last_error: Option<ChainClientError> = None;

    for attempt in 0..=params.retry_limit {
        let gas_multiplier = gas_price_multiplier_for_attempt(attempt, params);
        match client.submit_report(submission, gas_multiplier).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                warn!(attempt, %err, "report submission attempt failed");
                last_error = Some(err);
                if attempt < params.retry_limit {
                    tokio::time::sleep(backoff_for_attempt(attempt, params)).await;
                }
            }
        }
    }

    Err(ReporterError::SubmissionFailed {
        attempts: params.retry_limit + 1,
        last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use oracle_types::ReportedPair;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn params() -> RetryParams {
        RetryParams {
            retry_limit: 3,
            gas_price_multiplier_step: dec!(0.1),
            gas_price_multiplier_cap: dec!(2.0),
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn gas_multiplier_grows_then_caps() {
        let p = params();
        assert_eq!(gas_price_multiplier_for_attempt(0, &p), dec!(1));
        assert_eq!(gas_price_multiplier_for_attempt(1, &p), dec!(1.1));
        assert_eq!(gas_price_multiplier_for_attempt(2, &p), dec!(1.21));
        // Many attempts must never exceed the cap.
        assert_eq!(gas_price_multiplier_for_attempt(50, &p), dec!(2.0));
    }

    struct FlakyClient {
        fail_times: u32,
        calls: AtomicU32,
        seen_multipliers: Mutex<Vec<Decimal>>,
    }

    #[async_trait]
    impl ChainClient for FlakyClient {
        async fn find_neighbors(
            &self,
            _pair: ReportedPair,
            _value: Decimal,
        ) -> std::result::Result<crate::chain_client::Neighbors, ChainClientError> {
            unimplemented!()
        }

        async fn submit_report(
            &self,
            _submission: &ReportSubmission,
            gas_price_multiplier: Decimal,
        ) -> std::result::Result<(), ChainClientError> {
            self.seen_multipliers.lock().unwrap().push(gas_price_multiplier);
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_times {
                Err(ChainClientError::Transport("flaky".to_string()))
            } else {
                Ok(())
            }
        }

        async fn remove_expired(&self, _pair: ReportedPair) -> std::result::Result<(), ChainClientError> {
            Ok(())
        }

        async fn latest_block_timestamp_ms(&self) -> std::result::Result<i64, ChainClientError> {
            Ok(0)
        }
    }

    fn submission() -> ReportSubmission {
        ReportSubmission {
            reporter: "0xabc".to_string(),
            pair: ReportedPair::CeloUsd,
            numerator: 1,
            denominator: 1,
            lesser_neighbors: vec![],
            greater_neighbors: vec![],
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures_within_the_limit() {
        let client = FlakyClient {
            fail_times: 2,
            calls: AtomicU32::new(0),
            seen_multipliers: Mutex::new(Vec::new()),
        };
        let result = submit_with_retry(&client, &submission(), &params()).await;
        assert!(result.is_ok());
        let seen = client.seen_multipliers.into_inner().unwrap();
        assert_eq!(seen, vec![dec!(1), dec!(1.1), dec!(1.21)]);
    }

    #[tokio::test]
    async fn exhausts_and_reports_the_last_error() {
        let client = FlakyClient {
            fail_times: 100,
            calls: AtomicU32::new(0),
            seen_multipliers: Mutex::new(Vec::new()),
        };
        let err = submit_with_retry(&client, &submission(), &params()).await.unwrap_err();
        match err {
            ReporterError::SubmissionFailed { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
