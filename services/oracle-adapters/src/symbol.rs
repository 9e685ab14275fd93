//! Venue symbol formatting.
//!
//! Every venue quotes the same small set of `CurrencyPair`s, but each has its
//! own ticker alphabet: separator, case, leg order, and a handful of
//! currency codes that don't match the canonical one (Kraken's `XBT` for
//! `BTC` being the canonical example). Concrete adapters build their symbol
//! strings by picking a `SymbolFormat` and, where needed, overriding a
//! currency's per-venue token.

use std::fmt;

use oracle_types::{Currency, CurrencyPair};

/// How a venue joins base and quote into one ticker string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    None,
    Dash,
    Slash,
    Underscore,
}

impl Separator {
    fn as_str(&self) -> &'static str {
        match self {
            Separator::None => "",
            Separator::Dash => "-",
            Separator::Slash => "/",
            Separator::Underscore => "_",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Upper,
    Lower,
}

/// A venue's symbol formatting rule. Adapters construct one `const` instance
/// and reuse it for every pair they quote.
#[derive(Debug, Clone, Copy)]
pub struct SymbolFormat {
    pub separator: Separator,
    pub case: Case,
}

impl SymbolFormat {
    pub const fn new(separator: Separator, case: Case) -> Self {
        Self { separator, case }
    }

    /// Renders `pair` using `token_for` to map each leg's `Currency` to this
    /// venue's token for it (falling back to the canonical ISO-ish code via
    /// `Currency::as_str` when the venue has no override).
    pub fn render(&self, pair: CurrencyPair, token_for: impl Fn(Currency) -> &'static str) -> String {
        let base = token_for(pair.base);
        let quote = token_for(pair.quote);
        let joined = format!("{base}{sep}{quote}", sep = self.separator.as_str());
        match self.case {
            Case::Upper => joined.to_uppercase(),
            Case::Lower => joined.to_lowercase(),
        }
    }
}

impl fmt::Display for SymbolFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.separator, self.case)
    }
}

/// The canonical token for a currency absent any venue override. Most venues
/// use this directly; the handful that don't (Kraken's `XBT`) supply their
/// own `token_for` closure to `SymbolFormat::render`.
pub fn canonical_token(currency: Currency) -> &'static str {
    currency.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashed_upper_matches_coinbase_style() {
        let format = SymbolFormat::new(Separator::Dash, Case::Upper);
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usd).unwrap();
        assert_eq!(format.render(pair, canonical_token), "CELO-USD");
    }

    #[test]
    fn concatenated_lower_matches_binance_style() {
        let format = SymbolFormat::new(Separator::None, Case::Lower);
        let pair = CurrencyPair::new(Currency::Celo, Currency::Usdt).unwrap();
        assert_eq!(format.render(pair, canonical_token), "celousdt");
    }

    #[test]
    fn override_token_replaces_canonical_for_one_leg() {
        let format = SymbolFormat::new(Separator::None, Case::Upper);
        let pair = CurrencyPair::new(Currency::Btc, Currency::Usd).unwrap();
        let rendered = format.render(pair, |c| if c == Currency::Btc { "XBT" } else { canonical_token(c) });
        assert_eq!(rendered, "XBTUSD");
    }
}
