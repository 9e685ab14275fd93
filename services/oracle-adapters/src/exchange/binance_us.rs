use async_trait::async_trait;
use oracle_types::{CurrencyPair, Exchange, Ticker};
use serde_json::Value;

use crate::adapter::{get_json, ExchangeAdapter};
use crate::error::Result;
use crate::exchange::binance::{is_live_via_exchange_info, parse_24hr_ticker};
use crate::symbol::{canonical_token, Case, Separator, SymbolFormat};

const FORMAT: SymbolFormat = SymbolFormat::new(Separator::None, Case::Upper);

/// Binance.US mirrors Binance's REST shape exactly; only the host and the
/// tradable symbol set differ, so this adapter reuses `binance`'s parsing
/// and exchange-info liveness helpers rather than duplicating them.
pub struct BinanceUsAdapter {
    base_url: String,
}

impl BinanceUsAdapter {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.binance.us".to_string(),
        }
    }
}

impl Default for BinanceUsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceUsAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::BinanceUs
    }

    fn tls_host(&self) -> &'static str {
        "api.binance.us"
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
