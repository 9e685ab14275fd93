use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ConfigError;

static AZURE_KEY_VAULT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]{3,24}$").expect("static regex is valid"));

static HEX_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0x)?[0-9a-fA-F]{40}$").expect("static regex is valid"));

pub fn validate_azure_key_vault_name(value: &str) -> Result<(), ConfigError> {
    if AZURE_KEY_VAULT_NAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name: "AZURE_KEY_VAULT_NAME",
            value: value.to_string(),
            reason: "must match ^[A-Za-z0-9-]{3,24}$".to_string(),
        })
    }
}

pub fn validate_hex_address(name: &'static str, value: &str) -> Result<String, ConfigError> {
    if HEX_ADDRESS_RE.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be a 20-byte hex address, optionally 0x-prefixed".to_string(),
        })
    }
}

pub fn validate_url_scheme(
    name: &'static str,
    value: &str,
    allowed_schemes: &[&str],
) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: format!("not a valid URL: {e}"),
    })?;
    if allowed_schemes.contains(&parsed.scheme()) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: format!("scheme must be one of {allowed_schemes:?}"),
        })
    }
}

pub fn validate_port(name: &'static str, value: i64) -> Result<u16, ConfigError> {
    if (1..=65535).contains(&value) {
        Ok(value as u16)
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be in [1, 65535]".to_string(),
        })
    }
}

/// Validates a decimal lies in `[0, 1)`, as required for `AGGREGATION_SCALING_RATE`.
pub fn validate_unit_interval_exclusive(name: &'static str, value: Decimal) -> Result<Decimal, ConfigError> {
    if value >= Decimal::ZERO && value < Decimal::ONE {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be in [0, 1)".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azure_key_vault_name_accepts_valid_and_rejects_short() {
        assert!(validate_azure_key_vault_name("my-vault-01").is_ok());
        assert!(validate_azure_key_vault_name("ab").is_err());
        assert!(validate_azure_key_vault_name("has a space").is_err());
    }

    #[test]
    fn hex_address_accepts_with_and_without_prefix() {
        let addr = "0".repeat(40);
        assert!(validate_hex_address("X", &addr).is_ok());
        assert!(validate_hex_address("X", &format!("0x{addr}")).is_ok());
        assert!(validate_hex_address("X", "not-an-address").is_err());
    }

    #[test]
    fn url_scheme_enforced() {
        assert!(validate_url_scheme("HTTP_RPC_PROVIDER_URL", "https://rpc.example", &["http", "https"]).is_ok());
        assert!(validate_url_scheme("HTTP_RPC_PROVIDER_URL", "ftp://rpc.example", &["http", "https"]).is_err());
    }

    #[test]
    fn port_bounds() {
        assert!(validate_port("PROMETHEUS_PORT", 0).is_err());
        assert!(validate_port("PROMETHEUS_PORT", 65536).is_err());
        assert!(validate_port("PROMETHEUS_PORT", 9090).is_ok());
    }
}
