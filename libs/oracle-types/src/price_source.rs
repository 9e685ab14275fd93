use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyPair;
use crate::exchange::Exchange;

/// One leg of a price source: a venue quoting a pair, optionally inverted,
/// optionally contributing unit (ignored) volume weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSourceLeg {
    pub exchange: Exchange,
    pub pair: CurrencyPair,
    pub invert: bool,
    pub ignore_volume: bool,
}

/// A configured price source: an ordered chain of legs whose product yields
/// the effective price of the configured reporting pair. Most sources have
/// exactly one leg (a direct quote); multi-leg sources synthesize a price
/// through an intermediate currency (e.g. CELO/BTC * BTC/USD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSourceConfig {
    pub legs: Vec<PriceSourceLeg>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PriceSourceConfigError {
    #[error("a price source must have at least one leg")]
    Empty,
}

impl PriceSourceConfig {
    pub fn new(legs: Vec<PriceSourceLeg>) -> Result<Self, PriceSourceConfigError> {
        if legs.is_empty() {
            return Err(PriceSourceConfigError::Empty);
        }
        Ok(Self { legs })
    }

    /// A human-readable identifier used in log fields and metric labels,
    /// e.g. `"kraken_CELOUSD"` for a single-leg source.
    pub fn display_name(&self) -> String {
        self.legs
            .iter()
            .map(|leg| {
                let pair = if leg.invert {
                    leg.pair.inverted()
                } else {
                    leg.pair
                };
                format!("{}_{}", leg.exchange.as_str().to_lowercase(), pair)
            })
            .collect::<Vec<_>>()
            .join("*")
    }

    /// Combines per-leg mid-prices (and bid/ask) into the source's effective
    /// tick values: price is the product of (possibly inverted) leg mids;
    /// volume is `min(leg.base_volume)` unless any leg ignores volume, in
    /// which case the source contributes unit (equal) weight.
    pub fn combine_legs(&self, leg_values: &[LegValue]) -> Result<EffectiveTick, PriceSourceConfigError> {
        if leg_values.is_empty() || leg_values.len() != self.legs.len() {
            return Err(PriceSourceConfigError::Empty);
        }

        let mut mid = Decimal::ONE;
        let mut ask = Decimal::ONE;
        let mut bid = Decimal::ONE;
        let mut last_price = Decimal::ONE;
        let mut min_volume: Option<Decimal> = None;
        let mut any_ignore_volume = false;

        for (leg, value) in self.legs.iter().zip(leg_values.iter()) {
            let (leg_mid, leg_bid, leg_ask, leg_last) = if leg.invert {
                (
                    Decimal::ONE / value.mid,
                    Decimal::ONE / value.ask,
                    Decimal::ONE / value.bid,
                    Decimal::ONE / value.last_price,
                )
            } else {
                (value.mid, value.bid, value.ask, value.last_price)
            };
            mid *= leg_mid;
            bid *= leg_bid;
            ask *= leg_ask;
            last_price *= leg_last;

            if leg.ignore_volume {
                any_ignore_volume = true;
            } else {
                min_volume = Some(match min_volume {
                    Some(current) => current.min(value.base_volume),
                    None => value.base_volume,
                });
            }
        }

        let volume = if any_ignore_volume {
            Decimal::ONE
        } else {
            min_volume.unwrap_or(Decimal::ONE)
        };

        Ok(EffectiveTick {
            mid,
            bid,
            ask,
            last_price,
            volume,
        })
    }
}

/// A single leg's current mid/bid/ask/last-trade-price/volume, as fed into
/// `combine_legs`.
#[derive(Debug, Clone, Copy)]
pub struct LegValue {
    pub mid: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last_price: Decimal,
    pub base_volume: Decimal,
}

/// The source-level price/volume computed for one tick. `last_price` is the
/// product of each leg's last trade price, the scalar the TRADES aggregation
/// method weight-averages over (spec §4.3 Open Question resolution, see
/// DESIGN.md); `mid` is the same for MIDPRICES.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveTick {
    pub mid: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last_price: Decimal,
    pub volume: Decimal,
}
