use rust_decimal::Decimal;
use thiserror::Error;

/// Failure modes of one aggregation pass (spec §4.3). None of these are
/// fatal to the process; the caller (reporter) simply skips the tick.
#[derive(Debug, Error, PartialEq)]
pub enum AggregatorError {
    #[error("only {found} of the required {required} price sources are valid")]
    InsufficientSources { required: usize, found: usize },

    #[error("aggregated volume {actual} is below the required minimum {required}")]
    InsufficientVolume { required: Decimal, actual: Decimal },
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
