//! One HTTP fetch pipeline shared by every exchange driver, plus the 17
//! concrete venue adapters. Each adapter speaks only `serde_json::Value` and
//! its own endpoint shapes; everything venue-agnostic (certificate pinning,
//! timeouts, metrics, field validation) lives in `adapter`.

pub mod adapter;
pub mod error;
pub mod exchange;
pub mod metrics;
pub mod symbol;
pub mod tls_pin;
pub mod util;

pub use adapter::{fetch_ticker, ExchangeAdapter, FetchContext};
pub use error::{AdapterError, Result};
pub use metrics::AdapterMetrics;
