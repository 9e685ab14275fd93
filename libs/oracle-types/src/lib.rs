//! Shared domain types for the price oracle.
//!
//! This crate has no I/O and no async runtime dependency: it is the vocabulary
//! that `oracle-adapters`, `oracle-aggregator`, and `oracle-reporter` all speak.

pub mod aggregated_price;
pub mod currency;
pub mod exchange;
pub mod observation;
pub mod price_source;
pub mod ticker;
pub mod time;

pub use aggregated_price::AggregatedPrice;
pub use currency::{Currency, CurrencyPair, ParseCurrencyError, ReportedPair};
pub use exchange::Exchange;
pub use observation::{InsertOutcome, Observation, WindowedBuffer};
pub use price_source::{EffectiveTick, LegValue, PriceSourceConfig, PriceSourceLeg};
pub use ticker::{Ticker, TickerValidationError};
