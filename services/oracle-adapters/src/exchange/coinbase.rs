use async_trait::async_trait;
use oracle_types::{Currency, CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{Case, Separator, SymbolFormat};
use crate::util::{decimal_field, rfc3339_to_millis};

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::Dash, Case::Upper);

/// Coinbase lists CELO under its legacy ticker `CGLD`; every other currency
/// uses the canonical token (spec §4.1).
fn coinbase_token(currency: Currency) -> &'static str {
    match currency {
        Currency::Celo => "CGLD",
        other => crate::symbol::canonical_token(other),
    }
}

pub struct CoinbaseAdapter {
    base_url: String,
}

impl CoinbaseAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.exchange.coinbase.com".to_string(),
        }
    }
}

impl Default for CoinbaseAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for CoinbaseAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Coinbase
    }

    fn tls_host(&self) -> &'static str {
        "api.exchange.coinbase.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, coinbase_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/products/{symbol}", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        Ok(product_is_live(&raw))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/products/{symbol}/ticker", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let time = require_field(exchange, &raw, "time")?
            .as_str()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "time field was not a string".to_string(),
            })?;
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, &raw, "bid")?,
            ask: decimal_field(exchange, &raw, "ask")?,
            last_price: decimal_field(exchange, &raw, "price")?,
            base_volume: decimal_field(exchange, &raw, "volume")?,
            quote_volume: decimal_field(exchange, &raw, "volume")? * decimal_field(exchange, &raw, "price")?,
            timestamp_ms: rfc3339_to_millis(exchange, time)?,
        })
    }
}

/// Coinbase liveness (spec §4.1): `status == "online"` and neither
/// `post_only` nor `cancel_only` (both of which mean the book accepts
/// orders but won't match them, so a ticker read would be stale/misleading).
fn product_is_live(product: &Value) -> bool {
    let online = product.get("status").and_then(Value::as_str) == Some("online");
    let post_only = product.get("post_only").and_then(Value::as_bool).unwrap_or(false);
    let cancel_only = product.get("cancel_only").and_then(Value::as_bool).unwrap_or(false);
    online && !post_only && !cancel_only
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::Currency;
    use serde_json::json;

    #[test]
    fn symbol_is_dash_separated_upper_case() {
        let adapter = CoinbaseAdapter::new();
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usd).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "CGLD-USD");
    }

    #[test]
    fn parses_a_well_formed_ticker_response() {
        let adapter = CoinbaseAdapter::new();
        let raw = json!({
            "bid": "0.650",
            "ask": "0.655",
            "price": "0.652",
            "volume": "120000.5",
            "time": "2024-01-05T22:00:00Z",
        });
        let ticker = adapter.parse_ticker(raw, "CELO-USD", 0).unwrap();
        assert_eq!(ticker.symbol, "CELO-USD");
        assert_eq!(ticker.timestamp_ms, 1704492000000);
    }

    #[test]
    fn product_is_live_rejects_post_only_and_cancel_only() {
        assert!(product_is_live(&json!({"status": "online", "post_only": false, "cancel_only": false})));
        assert!(!product_is_live(&json!({"status": "online", "post_only": true, "cancel_only": false})));
        assert!(!product_is_live(&json!({"status": "offline", "post_only": false, "cancel_only": false})));
    }

    #[test]
    fn missing_bid_is_reported_by_field_name() {
        let adapter = CoinbaseAdapter::new();
        let raw = json!({"ask": "0.655", "price": "0.652", "volume": "1", "time": "2024-01-05T22:00:00Z"});
        let err = adapter.parse_ticker(raw, "CELO-USD", 0).unwrap_err();
        assert!(matches!(err, AdapterError::MissingFields { ref fields, .. } if fields == &vec!["bid".to_string()]));
    }
}
