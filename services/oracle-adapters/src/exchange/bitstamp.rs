use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::None, Case::Lower);

pub struct BitstampAdapter {
    base_url: String,
}

impl BitstampAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://www.bitstamp.net".to_string(),
        }
    }
}

impl Default for BitstampAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BitstampAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bitstamp
    }

    fn tls_host(&self) -> &'static str {
        "www.bitstamp.net"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/api/v2/trading-pairs-info/", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        let pairs = raw.as_array().ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange: self.exchange(),
            message: "trading-pairs-info response was not an array".to_string(),
        })?;
        Ok(pairs
            .iter()
            .find(|p| p.get("url_symbol").and_then(Value::as_str) == Some(symbol))
            .map(pair_is_live)
            .unwrap_or(false))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/api/v2/ticker/{symbol}/", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let timestamp = require_field(exchange, &raw, "timestamp")?
            .as_str()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "timestamp was not a string".to_string(),
            })?;
        let timestamp_s: i64 = timestamp.parse().map_err(|_| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("timestamp was not an integer string: {timestamp}"),
        })?;
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, &raw, "bid")?,
            ask: decimal_field(exchange, &raw, "ask")?,
            last_price: decimal_field(exchange, &raw, "last")?,
            base_volume: decimal_field(exchange, &raw, "volume")?,
            quote_volume: decimal_field(exchange, &raw, "volume")? * decimal_field(exchange, &raw, "last")?,
            timestamp_ms: timestamp_s * 1000,
        })
    }
}

/// Bitstamp liveness (spec §4.1): the pair's `trading == "Enabled"` and
/// `instant_and_market_orders == "Enabled"`.
fn pair_is_live(pair: &Value) -> bool {
    pair.get("trading").and_then(Value::as_str) == Some("Enabled")
        && pair.get("instant_and_market_orders").and_then(Value::as_str) == Some("Enabled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::Currency;
    use serde_json::json;

    #[test]
    fn symbol_is_concatenated_lower_case() {
        let adapter = BitstampAdapter::new();
        let pair = CurrencyPair::new(Currency::Btc, Currency::Usd).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "btcusd");
    }

    #[test]
    fn pair_is_live_requires_both_flags_enabled() {
        assert!(pair_is_live(&json!({"trading": "Enabled", "instant_and_market_orders": "Enabled"})));
        assert!(!pair_is_live(&json!({"trading": "Disabled", "instant_and_market_orders": "Enabled"})));
        assert!(!pair_is_live(&json!({"trading": "Enabled", "instant_and_market_orders": "Disabled"})));
    }

    #[test]
    fn parses_unix_seconds_timestamp_string() {
        let adapter = BitstampAdapter::new();
        let raw = json!({
            "bid": "0.64",
            "ask": "0.65",
            "last": "0.645",
            "volume": "10000",
            "timestamp": "1704492000",
        });
        let ticker = adapter.parse_ticker(raw, "btcusd", 0).unwrap();
        assert_eq!(ticker.timestamp_ms, 1704492000000);
    }
}
