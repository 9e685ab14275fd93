use oracle_types::Exchange;
use thiserror::Error;

/// Errors the fetch pipeline can produce for a single tick. All variants are
/// tick-local: none of them are fatal to the process (see spec §7).
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("certificate pin mismatch for {exchange}: {source}")]
    CertificatePin {
        exchange: Exchange,
        #[source]
        source: oracle_certs::CertificatePinError,
    },

    #[error("could not observe a TLS certificate from {exchange} to check against the pin: {source}")]
    CertificateProbe {
        exchange: Exchange,
        #[source]
        source: crate::tls_pin::TlsPinError,
    },

    #[error("orderbook is not live for {exchange}")]
    OrderbookDown { exchange: Exchange },

    #[error("request to {exchange} timed out after {timeout_ms}ms")]
    Timeout { exchange: Exchange, timeout_ms: u64 },

    #[error("{exchange} responded with HTTP {status}")]
    HttpStatus { exchange: Exchange, status: u16 },

    #[error("failed to parse {exchange} response as JSON: {source}")]
    JsonParse {
        exchange: Exchange,
        #[source]
        source: serde_json::Error,
    },

    #[error("{exchange} ticker is missing required field(s): {}", .fields.join(", "))]
    MissingFields {
        exchange: Exchange,
        fields: Vec<String>,
    },

    #[error("{exchange} ticker failed validation: {source}")]
    InvalidTicker {
        exchange: Exchange,
        #[source]
        source: oracle_types::TickerValidationError,
    },

    #[error("unexpected response shape from {exchange}: {message}")]
    UnexpectedResponse { exchange: Exchange, message: String },

    #[error("transport error contacting {exchange}: {source}")]
    Transport {
        exchange: Exchange,
        #[source]
        source: reqwest::Error,
    },
}

impl AdapterError {
    pub fn exchange(&self) -> Exchange {
        match self {
            AdapterError::CertificatePin { exchange, .. }
            | AdapterError::CertificateProbe { exchange, .. }
            | AdapterError::OrderbookDown { exchange }
            | AdapterError::Timeout { exchange, .. }
            | AdapterError::HttpStatus { exchange, .. }
            | AdapterError::JsonParse { exchange, .. }
            | AdapterError::MissingFields { exchange, .. }
            | AdapterError::InvalidTicker { exchange, .. }
            | AdapterError::UnexpectedResponse { exchange, .. }
            | AdapterError::Transport { exchange, .. } => *exchange,
        }
    }

    /// The §7 error taxonomy category, used to pick the metric label and the
    /// log level.
    pub fn category(&self) -> &'static str {
        match self {
            AdapterError::Transport { .. } | AdapterError::Timeout { .. } | AdapterError::HttpStatus { .. } => {
                "transient_network"
            }
            AdapterError::JsonParse { .. }
            | AdapterError::MissingFields { .. }
            | AdapterError::UnexpectedResponse { .. }
            | AdapterError::InvalidTicker { .. } => "protocol",
            AdapterError::CertificatePin { .. } | AdapterError::CertificateProbe { .. } => "security",
            AdapterError::OrderbookDown { .. } => "liveness",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
