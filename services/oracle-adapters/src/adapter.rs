use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use oracle_certs::CertificateManager;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;
use tracing::debug;

use crate::error::{AdapterError, Result};
use crate::metrics::AdapterMetrics;
use crate::tls_pin::observe_leaf_fingerprint;

/// Shared dependencies every venue driver needs but none of them own: the
/// HTTP client, the certificate manager, the metrics sink, and the clock
/// tolerances the fetch pipeline enforces uniformly.
pub struct FetchContext {
    pub http: reqwest::Client,
    pub certs: Arc<CertificateManager>,
    pub metrics: Arc<AdapterMetrics>,
    pub request_timeout: Duration,
    pub max_clock_skew_ms: i64,
}

impl FetchContext {
    pub fn new(certs: Arc<CertificateManager>, metrics: Arc<AdapterMetrics>, request_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            certs,
            metrics,
            request_timeout,
            max_clock_skew_ms: 5_000,
        }
    }
}

/// One driver per venue. Implementations hold no mutable state; everything
/// that varies tick-to-tick (the HTTP client, the cert manager, the clock)
/// comes in through `FetchContext`.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// The TLS host the REST endpoint lives on, used only for the leaf
    /// certificate fingerprint check — never for the request URL itself,
    /// which each driver builds from its own base URL.
    fn tls_host(&self) -> &'static str;

    /// `None` means this venue does not quote `pair` at all; the pipeline
    /// surfaces that as `AdapterError::UnexpectedResponse` rather than
    /// silently skipping it, since a misconfigured price source is a
    /// configuration bug, not a transient condition.
    fn symbol_for(&self, pair: CurrencyPair) -> Option<String>;

    /// Per-venue liveness predicate (spec §4 liveness table), scoped to the
    /// already-resolved venue `symbol` for this tick. Most crypto venues
    /// answer this from a dedicated status/markets endpoint, which is why
    /// this is async and carries its own `http` client; FX data providers
    /// instead fall back to the markets-closed calendar rule
    /// (`oracle_types::time::fx_markets_closed`) since they have no such
    /// endpoint, and `OpenExchangeRates` is always live.
    async fn is_live(&self, http: &reqwest::Client, symbol: &str, now_ms: i64) -> Result<bool> {
        let _ = symbol;
        if self.exchange().is_fx_provider() {
            let now = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(now_ms)
                .unwrap_or_else(chrono::Utc::now);
            Ok(!oracle_types::time::fx_markets_closed(now))
        } else {
            let _ = http;
            Ok(true)
        }
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value>;

    fn parse_ticker(&self, raw: Value, symbol: &str, now_ms: i64) -> Result<Ticker>;
}

/// Runs the full fetch pipeline for one venue/pair tick:
///
/// 1. liveness check
/// 2. symbol resolution
/// 3. TLS certificate pin verification
/// 4. HTTP fetch with a bounded timeout
/// 5. JSON parse
/// 6. venue-specific mapping into a `Ticker`
/// 7. cross-field ticker validation
///
/// Every failure is tick-local (see `AdapterError`); the caller decides how
/// a missing observation feeds into aggregation.
pub async fn fetch_ticker(
    adapter: &dyn ExchangeAdapter,
    ctx: &FetchContext,
    pair: CurrencyPair,
    now_ms: i64,
) -> Result<Ticker> {
    let exchange = adapter.exchange();
    let started = Instant::now();

    let outcome = fetch_ticker_inner(adapter, ctx, pair, now_ms).await;

    let label = match &outcome {
        Ok(_) => "success",
        Err(err) => err.category(),
    };
    ctx.metrics.record_outcome(exchange, label, started.elapsed());

    outcome
}

async fn fetch_ticker_inner(
    adapter: &dyn ExchangeAdapter,
    ctx: &FetchContext,
    pair: CurrencyPair,
    now_ms: i64,
) -> Result<Ticker> {
    let exchange = adapter.exchange();

    let symbol = adapter
        .symbol_for(pair)
        .ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("{pair} is not quoted on this venue"),
        })?;

    if !adapter.is_live(&ctx.http, &symbol, now_ms).await? {
        return Err(AdapterError::OrderbookDown { exchange });
    }

    verify_certificate_pin(adapter, ctx).await?;

    let raw = tokio::time::timeout(ctx.request_timeout, adapter.fetch_raw(&ctx.http, &symbol))
        .await
        .map_err(|_| AdapterError::Timeout {
            exchange,
            timeout_ms: ctx.request_timeout.as_millis() as u64,
        })??;

    let ticker = adapter.parse_ticker(raw, &symbol, now_ms)?;

    ticker
        .validate(now_ms, ctx.max_clock_skew_ms)
        .map_err(|source| AdapterError::InvalidTicker { exchange, source })?;

    debug!(%exchange, symbol, mid = %ticker.mid_price(), "fetched ticker");
    Ok(ticker)
}

/// Shared `GET` + status-check + JSON-decode helper every venue driver's
/// `fetch_raw` builds on, so the ten-odd adapters don't each re-derive the
/// same status/transport error mapping.
pub(crate) async fn get_json(http: &reqwest::Client, exchange: Exchange, url: &str) -> Result<Value> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|source| AdapterError::Transport { exchange, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AdapterError::HttpStatus {
            exchange,
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| AdapterError::Transport { exchange, source })?;

    serde_json::from_str(&body).map_err(|source| AdapterError::JsonParse { exchange, source })
}

/// Pulls a required field out of a parsed JSON object, mapping absence to
/// `AdapterError::MissingFields` so every venue reports missing-field errors
/// the same way instead of panicking on `unwrap`.
pub(crate) fn require_field<'a>(exchange: Exchange, raw: &'a Value, field: &'static str) -> Result<&'a Value> {
    raw.get(field).ok_or_else(|| AdapterError::MissingFields {
        exchange,
        fields: vec![field.to_string()],
    })
}

async fn verify_certificate_pin(adapter: &dyn ExchangeAdapter, ctx: &FetchContext) -> Result<()> {
    let exchange = adapter.exchange();
    let observed = observe_leaf_fingerprint(adapter.tls_host(), 443)
        .await
        .map_err(|source| AdapterError::CertificateProbe { exchange, source })?;

    ctx.certs
        .verify(exchange, &observed)
        .map_err(|source| AdapterError::CertificatePin { exchange, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_certs::CertificateManager;
    use oracle_types::Currency;
    use prometheus::Registry;
    use rust_decimal_macros::dec;

    struct StaticAdapter {
        exchange: Exchange,
        live: bool,
        symbol: Option<&'static str>,
        ticker: Ticker,
    }

    #[async_trait]
    impl ExchangeAdapter for StaticAdapter {
        fn exchange(&self) -> Exchange {
            self.exchange
        }

        fn tls_host(&self) -> &'static str {
            "example.invalid"
        }

        fn symbol_for(&self, _pair: CurrencyPair) -> Option<String> {
            self.symbol.map(|s| s.to_string())
        }

        async fn is_live(&self, _http: &reqwest::Client, _symbol: &str, _now_ms: i64) -> Result<bool> {
            Ok(self.live)
        }

        async fn fetch_raw(&self, _http: &reqwest::Client, _symbol: &str) -> Result<Value> {
            Ok(Value::Null)
        }

        fn parse_ticker(&self, _raw: Value, _symbol: &str, _now_ms: i64) -> Result<Ticker> {
            Ok(self.ticker.clone())
        }
    }

    fn ticker() -> Ticker {
        Ticker {
            source: Exchange::Kraken,
            symbol: "XBTUSD".into(),
            bid: dec!(100),
            ask: dec!(101),
            last_price: dec!(100.5),
            base_volume: dec!(10),
            quote_volume: dec!(1000),
            timestamp_ms: 1_000_000,
        }
    }

    fn ctx() -> FetchContext {
        let registry = Registry::new();
        FetchContext::new(
            Arc::new(CertificateManager::seeded()),
            Arc::new(AdapterMetrics::new(&registry)),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn non_live_adapter_short_circuits_before_any_network_call() {
        let adapter = StaticAdapter {
            exchange: Exchange::Xignite,
            live: false,
            symbol: Some("EURUSD"),
            ticker: ticker(),
        };
        let pair = CurrencyPair::new(Currency::Eur, Currency::Usd).unwrap();
        let err = fetch_ticker(&adapter, &ctx(), pair, 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::OrderbookDown { .. }));
    }

    #[tokio::test]
    async fn unquoted_pair_is_rejected_before_any_network_call() {
        let adapter = StaticAdapter {
            exchange: Exchange::Kraken,
            live: true,
            symbol: None,
            ticker: ticker(),
        };
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usd).unwrap();
        let err = fetch_ticker(&adapter, &ctx(), pair, 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnexpectedResponse { .. }));
    }
}
