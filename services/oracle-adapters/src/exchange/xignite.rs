use std::sync::Mutex;

use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::exchange::alphavantage::is_fresh;
use crate::symbol::canonical_token;
use crate::util::decimal_field;

pub struct XigniteAdapter {
    base_url: String,
    api_key: String,
    last_ticker_timestamp_ms: Mutex<Option<i64>>,
}

impl XigniteAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: "https://globalcurrencies.xignite.com".to_string(),
            api_key,
            last_ticker_timestamp_ms: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for XigniteAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Xignite
    }

    fn tls_host(&self) -> &'static str {
        "globalcurrencies.xignite.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(format!(
            "{}{}",
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
        let url = format!(
            "{}/xGlobalCurrencies.json/GetRealTimeRate?Symbol={symbol}&_token={}",
            self.base_url, self.api_key
        );
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let timestamp_s = require_field(exchange, &raw, "Timestamp")?
            .as_i64()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "Timestamp was not an integer".to_string(),
            })?;
        let timestamp_ms = timestamp_s * 1000;

        *self.last_ticker_timestamp_ms.lock().expect("lock poisoned") = Some(timestamp_ms);

        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, &raw, "Bid")?,
            ask: decimal_field(exchange, &raw, "Ask")?,
            last_price: decimal_field(exchange, &raw, "Mid")?,
            base_volume: dec!(1),
            quote_volume: dec!(1),
            timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::Currency;
    use serde_json::json;

    #[test]
    fn symbol_is_concatenated_currency_codes() {
        let adapter = XigniteAdapter::new("key".to_string());
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usd).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "CELOUSD");
    }

    #[test]
    fn parses_realtime_rate_response() {
        let adapter = XigniteAdapter::new("key".to_string());
        let raw = json!({
            "Bid": "0.64",
            "Ask": "0.65",
            "Mid": "0.645",
            "Timestamp": 1690451747_i64,
        });
        let ticker = adapter.parse_ticker(raw, "CELOUSD", 0).unwrap();
        assert_eq!(ticker.timestamp_ms, 1690451747_000);
    }

    #[tokio::test]
    async fn is_live_follows_the_thirty_minute_freshness_window() {
        let adapter = XigniteAdapter::new("key".to_string());
        let mock_time_ms = 1690451747_i64 * 1000;
        *adapter.last_ticker_timestamp_ms.lock().unwrap() = Some(mock_time_ms);

        let http = reqwest::Client::new();
        assert!(adapter
            .is_live(&http, "CELOUSD", mock_time_ms + 15 * 60 * 1000)
            .await
            .unwrap());
        assert!(!adapter
            .is_live(&http, "CELOUSD", mock_time_ms + 31 * 60 * 1000)
            .await
            .unwrap());
    }
}
