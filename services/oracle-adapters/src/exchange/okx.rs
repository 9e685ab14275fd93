use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::Dash, Case::Upper);

pub struct OkxAdapter {
    base_url: String,
}

impl OkxAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://www.okx.com".to_string(),
        }
    }
}

impl Default for OkxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for OkxAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Okx
    }

    fn tls_host(&self) -> &'static str {
        "www.okx.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/api/v5/public/instruments?instType=SPOT&instId={symbol}", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        Ok(okx_code_ok(&raw))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/api/v5/market/ticker?instId={symbol}", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        if !okx_code_ok(&raw) {
            return Err(AdapterError::UnexpectedResponse {
                exchange,
                message: format!("non-zero OKX response code: {raw}"),
            });
        }
        let data = require_field(exchange, &raw, "data")?
            .as_array()
            .and_then(|arr| arr.first())
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "data array was empty".to_string(),
            })?;
        let ts = require_field(exchange, data, "ts")?
            .as_str()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "ts was not a string".to_string(),
            })?;
        let ts: i64 = ts.parse().map_err(|_| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("ts was not an integer string: {ts}"),
        })?;
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, data, "bidPx")?,
            ask: decimal_field(exchange, data, "askPx")?,
            last_price: decimal_field(exchange, data, "last")?,
            base_volume: decimal_field(exchange, data, "vol24h")?,
            quote_volume: decimal_field(exchange, data, "volCcy24h")?,
            timestamp_ms: ts,
        })
    }
}

/// OKX/OKCoin liveness and response validity share one rule (spec §4.1):
/// the envelope's `code == "0"`.
pub(crate) fn okx_code_ok(envelope: &Value) -> bool {
    envelope.get("code").and_then(Value::as_str) == Some("0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::Currency;
    use serde_json::json;

    #[test]
    fn symbol_is_dash_separated_upper_case() {
        let adapter = OkxAdapter::new();
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usdt).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "CELO-USDT");
    }

    #[test]
    fn okx_code_ok_requires_zero_string() {
        assert!(okx_code_ok(&json!({"code": "0"})));
        assert!(!okx_code_ok(&json!({"code": "1"})));
        assert!(!okx_code_ok(&json!({"code": 0})));
    }

    #[test]
    fn parses_first_entry_of_data_array() {
        let adapter = OkxAdapter::new();
        let raw = json!({
            "code": "0",
            "data": [{
                "bidPx": "0.64",
                "askPx": "0.65",
                "last": "0.645",
                "vol24h": "50000",
                "volCcy24h": "32000",
                "ts": "1704492000000",
            }]
        });
        let ticker = adapter.parse_ticker(raw, "CELO-USDT", 0).unwrap();
        assert_eq!(ticker.timestamp_ms, 1704492000000);
    }

    #[test]
    fn rejects_non_zero_code() {
        let adapter = OkxAdapter::new();
        let raw = json!({"code": "50001", "data": []});
        assert!(adapter.parse_ticker(raw, "CELO-USDT", 0).is_err());
    }
}
