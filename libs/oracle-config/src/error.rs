#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to parse {name} as JSON: {source}")]
    Json {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
