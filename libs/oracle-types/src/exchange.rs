use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::currency::ParseCurrencyError;

/// Closed enumeration of venues the oracle can source prices from. Each
/// variant has exactly one adapter implementation (see `oracle-adapters`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exchange {
    Binance,
    BinanceUs,
    Bittrex,
    Coinbase,
    Bitstamp,
    KuCoin,
    Kraken,
    Gemini,
    Okx,
    OkCoin,
    BitMart,
    Bitget,
    Whitebit,
    Bitcointrade,
    Alphavantage,
    Xignite,
    OpenExchangeRates,
}

impl Exchange {
    pub const ALL: &'static [Exchange] = &[
        Exchange::Binance,
        Exchange::BinanceUs,
        Exchange::Bittrex,
        Exchange::Coinbase,
        Exchange::Bitstamp,
        Exchange::KuCoin,
        Exchange::Kraken,
        Exchange::Gemini,
        Exchange::Okx,
        Exchange::OkCoin,
        Exchange::BitMart,
        Exchange::Bitget,
        Exchange::Whitebit,
        Exchange::Bitcointrade,
        Exchange::Alphavantage,
        Exchange::Xignite,
        Exchange::OpenExchangeRates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "BINANCE",
            Exchange::BinanceUs => "BINANCEUS",
            Exchange::Bittrex => "BITTREX",
            Exchange::Coinbase => "COINBASE",
            Exchange::Bitstamp => "BITSTAMP",
            Exchange::KuCoin => "KUCOIN",
            Exchange::Kraken => "KRAKEN",
            Exchange::Gemini => "GEMINI",
            Exchange::Okx => "OKX",
            Exchange::OkCoin => "OKCOIN",
            Exchange::BitMart => "BITMART",
            Exchange::Bitget => "BITGET",
            Exchange::Whitebit => "WHITEBIT",
            Exchange::Bitcointrade => "BITCOINTRADE",
            Exchange::Alphavantage => "ALPHAVANTAGE",
            Exchange::Xignite => "XIGNITE",
            Exchange::OpenExchangeRates => "OPENEXCHANGERATES",
        }
    }

    /// Whether this venue is an FX data provider (subject to the
    /// markets-closed liveness exception) rather than a crypto exchange.
    pub fn is_fx_provider(&self) -> bool {
        matches!(
            self,
            Exchange::Alphavantage | Exchange::Xignite | Exchange::OpenExchangeRates
        )
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exchange::ALL
            .iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ParseCurrencyError(s.to_string()))
    }
}
