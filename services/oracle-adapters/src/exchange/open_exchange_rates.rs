use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::adapter::{get_json, require_field, ExchangeAdapter};
use crate::error::{AdapterError, Result};
use crate::symbol::canonical_token;
use crate::util::decimal_from_value;

pub struct OpenExchangeRatesAdapter {
    base_url: String,
    api_key: String,
}

impl OpenExchangeRatesAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: "https://openexchangerates.org".to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl ExchangeAdapter for OpenExchangeRatesAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::OpenExchangeRates
    }

    fn tls_host(&self) -> &'static str {
        "openexchangerates.org"
    }

    fn symbol_for(&self, pair: CurrencyPair) -> Option<String> {
        Some(format!(
            "{}{}",
            canonical_token(pair.base),
            canonical_token(pair.quote)
        ))
    }

    /// OpenExchangeRates is always live (spec §4.1) — it has no trading
    /// venue to go dark, just a published rate sheet.
    async fn is_live(&self, _http: &reqwest::Client, _symbol: &str, _now_ms: i64) -> Result<bool> {
        Ok(true)
    }

    async fn fetch_raw(&self, http: &reqwest::Client, symbol: &str) -> Result<Value> {
        // OpenExchangeRates only ever backs fiat-to-fiat legs in this system
        // (three-letter ISO codes on both sides), so splitting the
        // concatenated symbol in half is safe.
        let (base, quote) = symbol.split_at(symbol.len() / 2);
        let url = format!(
            "{}/api/latest.json?app_id={}&base={base}&symbols={quote}",
            self.base_url, self.api_key
        );
        get_json(http, self.exchange(), &url).await
    }

    fn parse_ticker(&self, raw: Value, symbol: &str, now_ms: i64) -> Result<Ticker> {
        let exchange = self.exchange();
        let rates = require_field(exchange, &raw, "rates")?;
        let quote_token = symbol.get(symbol.len() / 2..).ok_or_else(|| AdapterError::UnexpectedResponse {
            exchange,
            message: format!("malformed symbol: {symbol}"),
        })?;
        let rate_value = require_field(exchange, rates, quote_token)?;
        let rate = decimal_from_value(exchange, "rate", rate_value)?;
        let timestamp_ms = raw
            .get("timestamp")
            .and_then(Value::as_i64)
            .map(|s| s * 1000)
            .unwrap_or(now_ms);
        Ok(Ticker {
            source: exchange,
            symbol: symbol.to_string(),
            bid: rate,
            ask: rate,
            last_price: rate,
            base_volume: dec!(1),
            quote_volume: dec!(1),
            timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::Currency;
    use serde_json::json;

    #[test]
    fn symbol_is_concatenated_currency_codes() {
        let adapter = OpenExchangeRatesAdapter::new("key".to_string());
        let pair = CurrencyPair::new(Currency::Usd, Currency::Eur).unwrap();
        assert_eq!(adapter.symbol_for(pair).unwrap(), "USDEUR");
    }

    #[test]
    fn parses_rates_object_keyed_by_quote_token() {
        let adapter = OpenExchangeRatesAdapter::new("key".to_string());
        let raw = json!({
            "timestamp": 1704492000_i64,
            "rates": {"EUR": "0.91"},
        });
        let ticker = adapter.parse_ticker(raw, "USDEUR", 0).unwrap();
        assert_eq!(ticker.last_price, "0.91".parse().unwrap());
        assert_eq!(ticker.timestamp_ms, 1704492000000);
    }

    #[tokio::test]
    async fn is_live_is_unconditionally_true() {
        let adapter = OpenExchangeRatesAdapter::new("key".to_string());
        let http = reqwest::Client::new();
        assert!(adapter.is_live(&http, "USDEUR", 0).await.unwrap());
    }
}
