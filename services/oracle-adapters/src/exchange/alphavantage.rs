use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::canonical_token;

const THIRTY_MINUTES_MS: i64 = 30 * 60 * 1000;

/// Alphavantage's `CURRENCY_EXCHANGE_RATE` endpoint carries no liveness flag
/// of its own; freshness is inferred from how recently it last refreshed.
/// The FX-provider default `is_live` consults the last parsed ticker's
/// timestamp, which means this one adapter type needs a sliver of interior
/// state alongside the otherwise-stateless trait contract.
pub struct AlphavantageAdapter {
    base_url: String,
    api_key: String,
    last_ticker_timestamp_ms: Mutex<Option<i64>>,
}

impl AlphavantageAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: "https://www.alphavantage.co".to_string(),
            api_key,
            last_ticker_timestamp_ms: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for AlphavantageAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Alphavantage
    }

    fn tls_host(&self) -> &'static str {
        "www.alphavantage.co"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(format!(
            "{}/{}",
            canonical_token(pair.base),
            canonical_token(pair.quote)
        ))
    }

    async fn is_live(&self, _http: &reqwest::Client, _symbol: &str, now_ms: i64) -> Result<bool> {
        let now = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(now_ms)
            .unwrap_or_else(chrono::Utc::now);
        if oracle_types::time::fx_markets_closed(now) {
            return Ok(true);
        }
        let last = *self.last_ticker_timestamp_ms.lock().expect("lock poisoned");
        Ok(last.map(|ts| is_fresh(ts, now_ms)).unwrap_or(true))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let (from, to) = symbol.split_once('/').ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange: self.exchange(),
            message: format!("malformed alphavantage symbol: {symbol}"),
        })?;
        let url = format!(
            "{}/query?function=CURRENCY_EXCHANGE_RATE&from_currency={from}&to_currency={to}&apikey={}",
            self.base_url, self.api_key
        );
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let envelope = require_field(exchange, &raw, "Realtime Currency Exchange Rate")?;
        let rate_str = require_field(exchange, envelope, "5. Exchange Rate")?
            .as_str()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "exchange rate was not a string".to_string(),
            })?;
        let last_refreshed = require_field(exchange, envelope, "6. Last Refreshed")?
            .as_str()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "last refreshed was not a string".to_string(),
            })?;
        let last_price: Decimal = rate_str.parse().map_err(|_| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("exchange rate was not decimal-shaped: {rate_str}"),
        })?;
        let ask = last_price.round_dp(5);
        let bid = last_price * dec!(2) - ask;
        let timestamp_ms = parse_last_refreshed(exchange, last_refreshed)?;

        *self.last_ticker_timestamp_ms.lock().expect("lock poisoned") = Some(timestamp_ms);

        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid,
            ask,
            last_price,
            base_volume: dec!(1),
            quote_volume: dec!(1),
            timestamp_ms,
        })
    }
}

/// Alphavantage stamps `"6. Last Refreshed"` as a naive UTC datetime string
/// with no offset, e.g. `"2023-08-03 08:13:36"`.
fn parse_last_refreshed(exchange: Exchange, raw: &str) -> Result<i64> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc().timestamp_millis())
        .map_err(|_| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("could not parse last-refreshed timestamp: {raw}"),
        })
}

/// Alphavantage/Xignite liveness (spec §4.1): the most recently observed
/// ticker's timestamp is within 30 minutes of `now`.
pub(crate) fn is_fresh(last_ticker_timestamp_ms: i64, now_ms: i64) -> bool {
    (now_ms - last_ticker_timestamp_ms).abs() <= THIRTY_MINUTES_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::Currency;

    #[test]
    fn symbol_is_slash_separated_currency_codes() {
        let adapter = AlphavantageAdapter::new("key".to_string());
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usd).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "CELO/USD");
    }

    #[test]
    fn parses_the_literal_exchange_rate_example() {
        let adapter = AlphavantageAdapter::new("key".to_string());
        let raw = serde_json::json!({
            "Realtime Currency Exchange Rate": {
                "5. Exchange Rate": "0.00152950",
                "6. Last Refreshed": "2023-08-03 08:13:36",
            }
        });
        let ticker = adapter.parse_ticker(raw, "CELO/USD", 0).unwrap();
        assert_eq!(ticker.timestamp_ms, 1691050416_000);
        assert_eq!(ticker.last_price, "0.0015295".parse().unwrap());
        assert_eq!(ticker.ask, "0.00153".parse().unwrap());
        assert_eq!(ticker.bid, "0.001529".parse().unwrap());
        assert_eq!(ticker.base_volume, dec!(1));
        assert_eq!(ticker.quote_volume, dec!(1));
    }

    #[test]
    fn is_fresh_honors_thirty_minute_tolerance() {
        let mock_time = 1690451747_i64 * 1000;
        assert!(is_fresh(mock_time, mock_time + 15 * 60 * 1000));
        assert!(!is_fresh(mock_time, mock_time + 31 * 60 * 1000));
    }
}
