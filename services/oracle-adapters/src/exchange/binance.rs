use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};
use crate::util::decimal_field;

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::None, Case::Upper);

pub struct BinanceAdapter {
    base_url: String,
}

impl BinanceAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
        }
    }
}

impl Default for BinanceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    fn tls_host(&self) -> &'static str {
        "api.binance.com"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(FORMAT.render(pair, canonical_token))
    }

    async fn is_live(&self, http: &reqwest::Client, symbol: &str, _now_ms: i64) -> Result<bool> {
        is_live_via_exchange_info(&self.base_url, self.exchange(), http, symbol).await
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        let url = format!("{}/api/v3/ticker/24hr?symbol={symbol}", self.base_url);
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, _now_ms: i64) -> Result<Ticker> {
        parse_24hr_ticker(self.exchange(), raw, symbol)
    }
}

/// Binance/BinanceUS liveness (spec §4.1): `symbol` present, trading, spot
/// orders allowed, and the order-type set includes both `LIMIT` and
/// `MARKET`. Checked against `/api/v3/exchangeInfo` rather than folded into
/// the ticker fetch, since a venue can be TRADING for some symbols and not
/// others.
pub(crate) async fn is_live_via_exchange_info(
    base_url: &str,
    exchange: Exchange,
    http: &reqwest::Client,
    symbol: &str,
) -> Result<bool> {
    let url = format!("{base_url}/api/v3/exchangeInfo?symbol={symbol}");
    let raw = get_json(http, exchange, &url).await?;
    let symbols = require_field(exchange, &raw, "symbols")?
        .as_array()
        .ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange,
            message: "symbols was not an array".to_string(),
        })?;
    Ok(symbols
        .iter()
        .find(|entry| entry.get("symbol").and_then(Value::as_str) == Some(symbol))
        .map(symbol_is_live)
        .unwrap_or(false))
}

fn symbol_is_live(entry: &Value) -> bool {
    let status_ok = entry.get("status").and_then(Value::as_str) == Some("TRADING");
    let spot_ok = entry
        .get("isSpotTradingAllowed")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let order_types_ok = entry
        .get("orderTypes")
        .and_then(Value::as_array)
        .map(|types| {
            let types: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            types.contains(&"LIMIT") && types.contains(&"MARKET")
        })
        .unwrap_or(false);
    status_ok && spot_ok && order_types_ok
}

pub(crate) fn parse_24hr_ticker(exchange: Exchange, raw: Value, symbol: &str) -> Result<Ticker> {
    let close_time = require_field(exchange, &raw, "closeTime")?
        .as_i64()
        .ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange,
            message: "closeTime was not an integer".to_string(),
        })?;
    Ok(Ticker {
        source: exchange,
        symbol: symbol.to_string(),
        bid: decimal_field(exchange, &raw, "bidPrice")?,
        ask: decimal_field(exchange, &raw, "askPrice")?,
        last_price: decimal_field(exchange, &raw, "lastPrice")?,
        base_volume: decimal_field(exchange, &raw, "volume")?,
        quote_volume: decimal_field(exchange, &raw, "quoteVolume")?,
        timestamp_ms: close_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::Currency;
    use serde_json::json;

    #[test]
    fn symbol_is_concatenated_upper_case() {
        let adapter = BinanceAdapter::new();
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usdt).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "CELOUSDT");
    }

    #[test]
    fn parses_the_24hr_ticker_shape() {
        let adapter = BinanceAdapter::new();
        let raw = json!({
            "bidPrice": "0.650",
            "askPrice": "0.655",
            "lastPrice": "0.652",
            "volume": "1200000",
            "quoteVolume": "780000",
            "closeTime": 1704492000000_i64,
        });
        let ticker = adapter.parse_ticker(raw, "CELOUSDT", 0).unwrap();
        assert_eq!(ticker.timestamp_ms, 1704492000000);
    }

    #[test]
    fn exchange_info_symbol_live_requires_trading_spot_and_order_types() {
        let live = json!({
            "status": "TRADING",
            "isSpotTradingAllowed": true,
            "orderTypes": ["LIMIT", "MARKET", "STOP_LOSS"],
        });
        assert!(symbol_is_live(&live));

        let halted = json!({
            "status": "BREAK",
            "isSpotTradingAllowed": true,
            "orderTypes": ["LIMIT", "MARKET"],
        });
        assert!(!symbol_is_live(&halted));

        let no_market_orders = json!({
            "status": "TRADING",
            "isSpotTradingAllowed": true,
            "orderTypes": ["LIMIT"],
        });
        assert!(!symbol_is_live(&no_market_orders));
    }
}
