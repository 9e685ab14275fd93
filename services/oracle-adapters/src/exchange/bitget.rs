use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::None, Case::Upper);

pub struct BitgetAdapter {
    base_url: String,
}

impl BitgetAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.bitget.com".to_string(),
        }
    }
}

impl Default for BitgetAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BitgetAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bitget
    }

    fn tls_host(&self) -> &'static str {
        "api.bitget.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!(
            "{}/api/v2/spot/market/tickers?symbol={symbol}",
            self.base_url
        );
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let entry = require_field(exchange, &raw, "data")?
            .as_array()
            .and_then(|arr| arr.first())
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "data array was empty".to_string(),
            })?;
        if !entry_is_online(entry) {
            return Err(AdapterError::UnexpectedResponse {
                exchange,
                message: "symbol is not online".to_string(),
            });
        }
        let ts = require_field(exchange, entry, "ts")?
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
            bid: decimal_field(exchange, entry, "bidPr")?,
            ask: decimal_field(exchange, entry, "askPr")?,
            last_price: decimal_field(exchange, entry, "lastPr")?,
            base_volume: decimal_field(exchange, entry, "baseVolume")?,
            quote_volume: decimal_field(exchange, entry, "quoteVolume")?,
            timestamp_ms: ts,
        })
    }
}

/// Bitget liveness (spec §4.1): the ticker entry's own `status == "online"`,
/// so liveness is folded into the ticker fetch rather than a separate call.
fn entry_is_online(entry: &Value) -> bool {
    entry
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s == "online")
        .unwrap_or(true)
}
