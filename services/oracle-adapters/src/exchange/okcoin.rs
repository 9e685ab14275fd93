use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::exchange::okx::okx_code_ok;
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::Dash, Case::Upper);

/// OKCoin's REST API mirrors OKX's envelope shape (`code`/`data[]`), just on
/// a different host, so the response-validity and ticker-field logic is
/// shared with `okx` rather than duplicated.
pub struct OkCoinAdapter {
    base_url: String,
}

impl OkCoinAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://www.okcoin.com".to_string(),
        }
    }
}

impl Default for OkCoinAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for OkCoinAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::OkCoin
    }

    fn tls_host(&self) -> &'static str {
        "www.okcoin.com"
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
                message: format!("non-zero OKCoin response code: {raw}"),
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
