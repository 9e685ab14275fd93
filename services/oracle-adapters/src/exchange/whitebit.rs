use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::Underscore, Case::Upper);

pub struct WhitebitAdapter {
    base_url: String,
}

impl WhitebitAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://whitebit.com".to_string(),
        }
    }
}

impl Default for WhitebitAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for WhitebitAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Whitebit
    }

    fn tls_host(&self) -> &'static str {
        "whitebit.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/api/v4/public/markets", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        let exchange = self.exchange();
        let markets = raw.as_array().ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange,
            message: "markets response was not an array".to_string(),
        })?;
        Ok(markets
            .iter()
            .find(|m| m.get("name").and_then(Value::as_str) == Some(symbol))
            .map(market_is_tradable_spot)
            .unwrap_or(false))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/api/v4/public/ticker?market={symbol}", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, &raw, "bid")?,
            ask: decimal_field(exchange, &raw, "ask")?,
            last_price: decimal_field(exchange, &raw, "last_price")?,
            base_volume: decimal_field(exchange, &raw, "base_volume")?,
            quote_volume: decimal_field(exchange, &raw, "quote_volume")?,
            timestamp_ms: now_ms,
        })
    }
}

/// Whitebit liveness (spec §4.1): the market's `tradesEnabled == true` AND
/// `type == "spot"`.
fn market_is_tradable_spot(market: &Value) -> bool {
    market.get("tradesEnabled").and_then(Value::as_bool).unwrap_or(false)
        && market.get("type").and_then(Value::as_str) == Some("spot")
}
