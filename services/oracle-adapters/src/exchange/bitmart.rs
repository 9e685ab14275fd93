use async_trait::async_trait;
use oracle_types::{Currency, CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::Underscore, Case::Upper);

/// BitMart lists the Celo Euro stable token as `EURC`; every other currency
/// uses the canonical token (spec §4.1).
fn bitmart_token(currency: Currency) -> &'static str {
    match currency {
        Currency::Euroc => "EURC",
        other => crate::symbol::canonical_token(other),
    }
}

pub struct BitMartAdapter {
    base_url: String,
}

impl BitMartAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api-cloud.bitmart.com".to_string(),
        }
    }
}

impl Default for BitMartAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BitMartAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::BitMart
    }

    fn tls_host(&self) -> &'static str {
        "api-cloud.bitmart.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, bitmart_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        let url = format!("{}/spot/v1/symbols/details", self.base_url);
        let raw = get_json(http, self.exchange(), &url).await?;
        let exchange = self.exchange();
        let symbols = require_field(exchange, &raw, "data")
            .and_then(|d| require_field(exchange, d, "symbols"))?
            .as_array()
            .ok_or_else(|| AdapterError::UnexpectedResponse {
                exchange,
                message: "symbols was not an array".to_string(),
            })?;
        Ok(symbols
            .iter()
            .find(|s| s.get("symbol").and_then(Value::as_str) == Some(symbol))
            .map(symbol_is_trading)
            .unwrap_or(false))
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/spot/quotation/v3/ticker?symbol={symbol}", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let data = require_field(exchange, &raw, "data")?;
        let timestamp_ms = data
            .get("ms_t")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(now_ms);
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: decimal_field(exchange, data, "bid_px")?,
            ask: decimal_field(exchange, data, "ask_px")?,
            last_price: decimal_field(exchange, data, "last")?,
            base_volume: decimal_field(exchange, data, "base_volume_24h")?,
            quote_volume: decimal_field(exchange, data, "qty_24h")?,
            timestamp_ms,
        })
    }
}

/// BitMart liveness (spec §4.1): the pair's `trade_status == "trading"`.
fn symbol_is_trading(entry: &Value) -> bool {
    entry.get("trade_status").and_then(Value::as_str) == Some("trading")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn symbol_is_underscore_separated_upper_case() {
        let adapter = BitMartAdapter::new();
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usdt).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "CELO_USDT");
    }

    #[test]
    fn euroc_is_rendered_as_eurc() {
        let adapter = BitMartAdapter::new();
        let pair = CurrencyPair::new(Currency::Euroc, Currency::Usdt).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "EURC_USDT");
    }

    #[test]
    fn symbol_is_trading_checks_trade_status() {
        assert!(symbol_is_trading(&json!({"trade_status": "trading"})));
        assert!(!symbol_is_trading(&json!({"trade_status": "pre-trade"})));
    }

    #[test]
    fn parses_quotation_v3_ticker_envelope() {
        let adapter = BitMartAdapter::new();
        let raw = json!({
            "data": {
                "bid_px": "0.64",
                "ask_px": "0.65",
                "last": "0.645",
                "base_volume_24h": "50000",
                "qty_24h": "32000",
                "ms_t": "1704492000000",
            }
        });
        let ticker = adapter.parse_ticker(raw, "CELO_USDT", 0).unwrap();
        assert_eq!(ticker.timestamp_ms, 1704492000000);
    }
}
