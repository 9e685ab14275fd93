use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::canonical_token;
use crate::util::decimal_field;

pub struct BitcointradeAdapter {
    base_url: String,
}

impl BitcointradeAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.bitcointrade.com.br".to_string(),
        }
    }
}

impl Default for BitcointradeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BitcointradeAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bitcointrade
    }

    fn tls_host(&self) -> &'static str {
        "api.bitcointrade.com.br"
    }

    /// Bitcointrade quotes pairs base-first like every other venue
    /// (`BTCBRL`) but the pair is inverted relative to the adapter's
    /// configured leg order before rendering, per spec §4.1.
    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        let inverted = pair.inverted();
        Some(format!(
            "{}{}",
            canonical_token(inverted.base),
            canonical_token(inverted.quote)
        ))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/v3/public/{symbol}/pairs", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        let exchange = self.exchange();
        let data = require_field(exchange, &raw, "data")?
            .as_array()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "data was not an array".to_string(),
            })?;
        Ok(data
            .iter()
            .find(|p| p.get("code").and_then(Value::as_str) == Some(symbol))
            .map(pair_is_enabled)
            .unwrap_or(false))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/v3/public/{symbol}/ticker", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let data = require_field(exchange, &raw, "data")?;
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, data, "buy")?,
            ask: decimal_field(exchange, data, "sell")?,
            last_price: decimal_field(exchange, data, "last")?,
            base_volume: decimal_field(exchange, data, "volume")?,
            quote_volume: decimal_field(exchange, data, "volume")? * decimal_field(exchange, data, "last")?,
            timestamp_ms: now_ms,
        })
    }
}

/// Bitcointrade liveness (spec §4.1): the pair's own `enabled == true`.
fn pair_is_enabled(pair: &Value) -> bool {
    pair.get("enabled").and_then(Value::as_bool).unwrap_or(false)
}
