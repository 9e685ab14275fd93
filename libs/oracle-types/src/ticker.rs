use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::exchange::Exchange;

/// A single venue's snapshot of a trading pair's order book top and last
/// trade, as returned by an adapter's `fetch_ticker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub source: Exchange,
    pub symbol: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last_price: Decimal,
    pub base_volume: Decimal,
    pub quote_volume: Decimal,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TickerValidationError {
    #[error("bid {bid} is greater than ask {ask}")]
    BidAboveAsk { bid: Decimal, ask: Decimal },
    #[error("negative field in ticker: {field} = {value}")]
    NegativeField { field: &'static str, value: Decimal },
    #[error("ticker timestamp {timestamp_ms}ms is {skew_ms}ms in the future, beyond the allowed clock skew of {max_skew_ms}ms")]
    TimestampInFuture {
        timestamp_ms: i64,
        skew_ms: i64,
        max_skew_ms: i64,
    },
}

impl Ticker {
    /// Validates the cross-field invariants from the data model: `bid <= ask`,
    /// all numeric fields non-negative, and the timestamp not in the future
    /// beyond `max_skew_ms` of clock tolerance.
    pub fn validate(&self, now_ms: i64, max_skew_ms: i64) -> Result<(), TickerValidationError> {
        if self.bid > self.ask {
            return Err(TickerValidationError::BidAboveAsk {
                bid: self.bid,
                ask: self.ask,
            });
        }
        for (field, value) in [
            ("bid", self.bid),
            ("ask", self.ask),
            ("last_price", self.last_price),
            ("base_volume", self.base_volume),
            ("quote_volume", self.quote_volume),
        ] {
            if value < Decimal::ZERO {
                return Err(TickerValidationError::NegativeField { field, value });
            }
        }
        let skew_ms = self.timestamp_ms - now_ms;
        if skew_ms > max_skew_ms {
            return Err(TickerValidationError::TimestampInFuture {
                timestamp_ms: self.timestamp_ms,
                skew_ms,
                max_skew_ms,
            });
        }
        Ok(())
    }

    pub fn mid_price(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// `(ask - bid) / mid` — undefined (returns `Decimal::MAX`) for a
    /// zero mid-price, which the aggregator then rejects as excessive spread.
    pub fn bid_ask_spread_pct(&self) -> Decimal {
        let mid = self.mid_price();
        if mid.is_zero() {
            return Decimal::MAX;
        }
        (self.ask - self.bid) / mid
    }
}
