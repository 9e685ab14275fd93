use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::None, Case::Lower);

pub struct GeminiAdapter {
    base_url: String,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.gemini.com".to_string(),
        }
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for GeminiAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Gemini
    }

    fn tls_host(&self) -> &'static str {
        "api.gemini.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/v1/symbols/details/{symbol}", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        Ok(symbol_is_open(&raw))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/v1/pubticker/{symbol}", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let volume = require_field(exchange, &raw, "volume")?;
        let (base_volume, timestamp_ms) = gemini_volume_fields(exchange, volume, symbol, now_ms)?;
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, &raw, "bid")?,
            ask: decimal_field(exchange, &raw, "ask")?,
            last_price: decimal_field(exchange, &raw, "last")?,
            base_volume,
            quote_volume: base_volume * decimal_field(exchange, &raw, "last")?,
            timestamp_ms,
        })
    }
}

/// Gemini liveness (spec §4.1): the symbol details endpoint's `status == "open"`.
fn symbol_is_open(details: &Value) -> bool {
    details.get("status").and_then(Value::as_str) == Some("open")
}

/// Gemini's `volume` object keys the base-asset amount by the base token
/// itself (e.g. `{"BTC": "1.5", "USD": "...", "timestamp": 169...}`), so the
/// base-volume field name depends on the pair being quoted.
fn gemini_volume_fields(
    exchange: Exchange,
    volume: &Value,
    symbol: &str,
    fallback_now_ms: i64,
) -> Result<(rust_decimal::Decimal, i64)> {
    let base_token = symbol[..symbol.len().saturating_sub(3)].to_uppercase();
    let base_volume = volume
        .get(&base_token)
        .ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("volume object missing base token {base_token}"),
        })
        .and_then(|v| crate::util::decimal_from_value(exchange, "volume", v))?;
    let timestamp_ms = volume
        .get("timestamp")
        .and_then(Value::as_i64)
        .unwrap_or(fallback_now_ms);
    Ok((base_volume, timestamp_ms))
}
