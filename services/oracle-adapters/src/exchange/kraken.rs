use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_from_value;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::None, Case::Upper);

pub struct KrakenAdapter {
    base_url: String,
}

impl KrakenAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.kraken.com".to_string(),
        }
    }
}

impl Default for KrakenAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for KrakenAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Kraken
    }

    fn tls_host(&self) -> &'static str {
        "api.kraken.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn is_live(&self, http: &reqwest::Client, _symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/0/public/SystemStatus", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        let result = require_field(self.exchange(), &raw, "result")?;
        Ok(system_status_is_online(result))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/0/public/Ticker?pair={symbol}", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let errors = raw.get("error").and_then(Value::as_array);
        if let Some(errors) = errors {
            if !errors.is_empty() {
                return Err(AdapterError::UnexpectedResponse {
                    exchange,
                    message: format!("kraken error array: {errors:?}"),
                });
            }
        }
        let result = require_field(exchange, &raw, "result")?
            .as_object()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "result was not an object".to_string(),
            })?;
        if result.len() != 1 {
            return Err(AdapterError::UnexpectedResponse {
                exchange,
                message: format!("Unexpected number of pairs in ticker response: {}", result.len()),
            });
        }
        let entry = result.values().next().expect("checked len == 1 above");
        let ask = first_of_triplet(exchange, entry, "a")?;
        let bid = first_of_triplet(exchange, entry, "b")?;
        let last_price = first_of_pair(exchange, entry, "c")?;
        let volume_today = first_of_pair(exchange, entry, "v")?;
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid,
            ask,
            last_price,
            base_volume: volume_today,
            quote_volume: volume_today * last_price,
            timestamp_ms: _now_ms,
        })
    }
}

/// Kraken liveness (spec §4.1): the exchange-wide system status, not a
/// per-pair flag.
fn system_status_is_online(result: &Value) -> bool {
    result.get("status").and_then(Value::as_str) == Some("online")
}

fn first_of_triplet(exchange: Exchange, entry: &Value, field: &'static str) -> Result<rust_decimal::Decimal> {
    nth_of_array(exchange, entry, field, 0)
}

fn first_of_pair(exchange: Exchange, entry: &Value, field: &'static str) -> Result<rust_decimal::Decimal> {
    nth_of_array(exchange, entry, field, 0)
}

fn nth_of_array(exchange: Exchange, entry: &Value, field: &'static str, index: usize) -> Result<rust_decimal::Decimal> {
    let array = require_field(exchange, entry, field)?
        .as_array()
        .ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("{field} was not an array"),
        })?;
    let value = array.get(index).ok_or_else(|| AdapterError::UnexpectedResponse {
        exchange,
        message: format!("{field}[{index}] was missing"),
    })?;
    decimal_from_value(exchange, field, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::Currency;
    use serde_json::json;

    #[test]
    fn symbol_is_concatenated_upper_case() {
        let adapter = KrakenAdapter::new();
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usd).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "CELOUSD");
    }

    #[test]
    fn system_status_is_online_checks_status_field() {
        assert!(system_status_is_online(&json!({"status": "online"})));
        assert!(!system_status_is_online(&json!({"status": "maintenance"})));
    }

    #[test]
    fn rejects_a_ticker_response_with_more_than_one_pair() {
        let adapter = KrakenAdapter::new();
        let raw = json!({
            "error": [],
            "result": {
                "CELOUSD": {"a": ["0.65"], "b": ["0.64"], "c": ["0.645"], "v": ["100", "500"]},
                "CELOEUR": {"a": ["0.60"], "b": ["0.59"], "c": ["0.595"], "v": ["100", "500"]},
            }
        });
        let err = adapter.parse_ticker(raw, "CELOUSD", 0).unwrap_err();
        match err {
            AdapterError::UnexpectedResponse { message, .. } => {
                assert_eq!(message, "Unexpected number of pairs in ticker response: 2");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn parses_a_single_pair_ticker_response() {
        let adapter = KrakenAdapter::new();
        let raw = json!({
            "error": [],
            "result": {
                "CELOUSD": {
                    "a": ["0.655", "1", "1.000"],
                    "b": ["0.645", "1", "1.000"],
                    "c": ["0.650", "100"],
                    "v": ["5000", "9000"],
                }
            }
        });
        let ticker = adapter.parse_ticker(raw, "CELOUSD", 1704492000000).unwrap();
        assert_eq!(ticker.base_volume, "5000".parse().unwrap());
        assert_eq!(ticker.timestamp_ms, 1704492000000);
    }
}
