use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed enumeration of currencies the oracle knows how to price.
///
/// New currencies require a code change and a new adapter-side symbol
/// mapping; there is no dynamic registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    Celo,
    Btc,
    Eth,
    Usd,
    Eur,
    Brl,
    Xof,
    /* Circle's EUR-pegged stablecoin; some venues list it as EURC */
    Euroc,
    Usdc,
    Usdt,
    CUsd,
    CEur,
    CReal,
}

impl Currency {
    pub const ALL: &'static [Currency] = &[
        Currency::Celo,
        Currency::Btc,
        Currency::Eth,
        Currency::Usd,
        Currency::Eur,
        Currency::Brl,
        Currency::Xof,
        Currency::Euroc,
        Currency::Usdc,
        Currency::Usdt,
        Currency::CUsd,
        Currency::CEur,
        Currency::CReal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Celo => "CELO",
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Brl => "BRL",
            Currency::Xof => "XOF",
            Currency::Euroc => "EUROC",
            Currency::Usdc => "USDC",
            Currency::Usdt => "USDT",
            Currency::CUsd => "CUSD",
            Currency::CEur => "CEUR",
            Currency::CReal => "CREAL",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized currency: {0}")]
pub struct ParseCurrencyError(pub String);

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ParseCurrencyError(s.to_string()))
    }
}

/// An ordered (base, quote) pair. `base != quote` is enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: Currency,
    pub quote: Currency,
}

impl CurrencyPair {
    pub fn new(base: Currency, quote: Currency) -> Result<Self, InvalidPairError> {
        if base == quote {
            return Err(InvalidPairError { currency: base });
        }
        Ok(Self { base, quote })
    }

    pub fn inverted(&self) -> Self {
        Self {
            base: self.quote,
            quote: self.base,
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("currency pair base and quote must differ, got {currency} for both")]
pub struct InvalidPairError {
    pub currency: Currency,
}

/// The configured reporting pairs recognized by `CURRENCY_PAIR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportedPair {
    CeloUsd,
    CeloEur,
    CeloBrl,
    CeloBtc,
}

impl ReportedPair {
    pub fn as_currency_pair(&self) -> CurrencyPair {
        let (base, quote) = match self {
            ReportedPair::CeloUsd => (Currency::Celo, Currency::Usd),
            ReportedPair::CeloEur => (Currency::Celo, Currency::Eur),
            ReportedPair::CeloBrl => (Currency::Celo, Currency::Brl),
            ReportedPair::CeloBtc => (Currency::Celo, Currency::Btc),
        };
        CurrencyPair::new(base, quote).expect("reported pairs always have distinct legs")
    }
}

impl FromStr for ReportedPair {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CELOUSD" => Ok(ReportedPair::CeloUsd),
            "CELOEUR" => Ok(ReportedPair::CeloEur),
            "CELOBRL" => Ok(ReportedPair::CeloBrl),
            "CELOBTC" => Ok(ReportedPair::CeloBtc),
            other => Err(ParseCurrencyError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_round_trips_through_display_and_from_str() {
        for c in Currency::ALL {
            let parsed: Currency = c.to_string().parse().unwrap();
            assert_eq!(*c, parsed);
        }
    }

    #[test]
    fn pair_rejects_equal_legs() {
        assert!(CurrencyPair::new(Currency::Celo, Currency::Celo).is_err());
    }

    #[test]
    fn pair_inverts() {
        let p = CurrencyPair::new(Currency::Celo, Currency::Usd).unwrap();
        let inv = p.inverted();
        assert_eq!(inv.base, Currency::Usd);
        assert_eq!(inv.quote, Currency::Celo);
    }

    #[test]
    fn reported_pair_parses_case_exactly() {
        assert_eq!(
            "CELOBTC".parse::<ReportedPair>().unwrap(),
            ReportedPair::CeloBtc
        );
        assert!("celobtc".parse::<ReportedPair>().is_err());
    }
}
