use oracle_types::{Currency, CurrencyPair, Exchange, PriceSourceConfig, PriceSourceLeg};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
struct LegSpec {
    exchange: String,
    base: String,
    quote: String,
    #[serde(default)]
    invert: bool,
    #[serde(default)]
    #[serde(rename = "ignoreVolume")]
    ignore_volume: bool,
}

/// Parses the `PRICE_SOURCES` environment variable: a JSON array of source
/// groups, each itself an array of leg specs, e.g.
///
/// ```json
/// [
///   [{"exchange": "KRAKEN", "base": "CELO", "quote": "USD"}],
///   [
///     {"exchange": "BINANCE", "base": "CELO", "quote": "BTC"},
///     {"exchange": "COINBASE", "base": "BTC", "quote": "USD", "invert": true}
///   ]
/// ]
/// ```
pub fn parse_price_sources(raw: &str) -> Result<Vec<PriceSourceConfig>, ConfigError> {
    let groups: Vec<Vec<LegSpec>> =
        serde_json::from_str(raw).map_err(|source| ConfigError::Json {
            name: "PRICE_SOURCES",
            source,
        })?;

    groups
        .into_iter()
        .map(|legs| {
            let legs = legs
                .into_iter()
                .map(|spec| {
                    let exchange: Exchange = spec.exchange.parse().map_err(|_| {
                        ConfigError::InvalidValue {
                            name: "PRICE_SOURCES",
                            value: spec.exchange.clone(),
                            reason: "unrecognized exchange".to_string(),
                        }
                    })?;
                    let base: Currency = spec.base.parse().map_err(|_| ConfigError::InvalidValue {
                        name: "PRICE_SOURCES",
                        value: spec.base.clone(),
                        reason: "unrecognized base currency".to_string(),
                    })?;
                    let quote: Currency = spec.quote.parse().map_err(|_| ConfigError::InvalidValue {
                        name: "PRICE_SOURCES",
                        value: spec.quote.clone(),
                        reason: "unrecognized quote currency".to_string(),
                    })?;
                    let pair = CurrencyPair::new(base, quote).map_err(|_| ConfigError::InvalidValue {
                        name: "PRICE_SOURCES",
                        value: format!("{base}/{quote}"),
                        reason: "base and quote must differ".to_string(),
                    })?;
                    Ok(PriceSourceLeg {
                        exchange,
                        pair,
                        invert: spec.invert,
                        ignore_volume: spec.ignore_volume,
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;

            PriceSourceConfig::new(legs).map_err(|_| ConfigError::InvalidValue {
                name: "PRICE_SOURCES",
                value: "[]".to_string(),
                reason: "a source group must have at least one leg".to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_leg_group() {
        let raw = r#"[[{"exchange": "KRAKEN", "base": "CELO", "quote": "USD"}]]"#;
        let sources = parse_price_sources(raw).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].legs.len(), 1);
        assert_eq!(sources[0].legs[0].exchange, Exchange::Kraken);
    }

    #[test]
    fn parses_multi_leg_group_with_invert_and_ignore_volume() {
        let raw = r#"[[
            {"exchange": "BINANCE", "base": "CELO", "quote": "BTC"},
            {"exchange": "COINBASE", "base": "BTC", "quote": "USD", "invert": true, "ignoreVolume": true}
        ]]"#;
        let sources = parse_price_sources(raw).unwrap();
        assert_eq!(sources[0].legs.len(), 2);
        assert!(sources[0].legs[1].invert);
        assert!(sources[0].legs[1].ignore_volume);
    }

    #[test]
    fn rejects_unrecognized_exchange() {
        let raw = r#"[[{"exchange": "NOT_A_VENUE", "base": "CELO", "quote": "USD"}]]"#;
        assert!(parse_price_sources(raw).is_err());
    }

    #[test]
    fn rejects_empty_leg_group() {
        let raw = r#"[[]]"#;
        assert!(parse_price_sources(raw).is_err());
    }
}
