use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::Dash, Case::Upper);

pub struct KuCoinAdapter {
    base_url: String,
}

impl KuCoinAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.kucoin.com".to_string(),
        }
    }
}

impl Default for KuCoinAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for KuCoinAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::KuCoin
    }

    fn tls_host(&self) -> &'static str {
        "api.kucoin.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/api/v2/symbols/{symbol}", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        let data = require_field(self.exchange(), &raw, "data")?;
        Ok(symbol_is_live(data))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!(
            "{}/api/v1/market/orderbook/level1?symbol={symbol}",
            self.base_url
        );
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let data = require_field(exchange, &raw, "data")?;
        let time = require_field(exchange, data, "time")?
            .as_i64()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "time was not an integer".to_string(),
            })?;
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, data, "bestBid")?,
            ask: decimal_field(exchange, data, "bestAsk")?,
            last_price: decimal_field(exchange, data, "price")?,
            base_volume: decimal_field(exchange, data, "size")?,
            quote_volume: decimal_field(exchange, data, "size")? * decimal_field(exchange, data, "price")?,
            timestamp_ms: time,
        })
    }
}

/// KuCoin liveness (spec §4.1): the symbol's own `enableTrading == true`.
fn symbol_is_live(data: &Value) -> bool {
    data.get("enableTrading").and_then(Value::as_bool).unwrap_or(false)
}
