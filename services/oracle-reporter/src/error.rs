use thiserror::Error;

/// Failure modes of the reporter (spec §4.4, §7). Only submission exhaustion
/// and chain-client errors propagate past one tick; everything else (no
/// valid aggregate this tick, circuit breaker suppression) is handled by the
/// state machine without ever reaching `main`.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("submission failed after {attempts} attempt(s): {last_error}")]
    SubmissionFailed { attempts: u32, last_error: String },

    #[error("chain client error: {0}")]
    ChainClient(String),
}

pub type Result<T> = std::result::Result<T, ReporterError>;
