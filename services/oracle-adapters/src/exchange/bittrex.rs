use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::{decimal_field, rfc3339_to_millis};

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::Dash, Case::Upper);

pub struct BittrexAdapter {
    base_url: String,
}

impl BittrexAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.bittrex.com".to_string(),
        }
    }
}

impl Default for BittrexAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BittrexAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bittrex
    }

    fn tls_host(&self) -> &'static str {
        "api.bittrex.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/v3/markets/{symbol}", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        Ok(market_is_live(&raw))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let ticker = get_json(http, self.exchange(), &format!("{}/v3/markets/{symbol}/ticker", self.base_url)).await?;
        let summary = get_json(
            http,
            self.exchange(),
            &format!("{}/v3/markets/{symbol}/summary", self.base_url),
        )
        .await?;
        let mut merged = ticker;
        if let (Value::Object(merged), Value::Object(summary)) = (&mut merged, summary) {
            merged.extend(summary);
        }
        Ok(merged)
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let updated_at = require_field(exchange, &raw, "updatedAt")?
            .as_str()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "updatedAt was not a string".to_string(),
            })?;
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, &raw, "bidRate")?,
            ask: decimal_field(exchange, &raw, "askRate")?,
            last_price: decimal_field(exchange, &raw, "lastTradeRate")?,
            base_volume: decimal_field(exchange, &raw, "volume")?,
            quote_volume: decimal_field(exchange, &raw, "quoteVolume")?,
            timestamp_ms: rfc3339_to_millis(exchange, updated_at)?,
        })
    }
}

/// Bittrex liveness (spec §4.1): the market's own `status == "ONLINE"`.
fn market_is_live(market: &Value) -> bool {
    market.get("status").and_then(Value::as_str) == Some("ONLINE")
}
