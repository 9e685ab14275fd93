//! Builds only the adapters a configuration actually needs. The three FX
//! providers require an API key that isn't set in every deployment, so the
//! registry is built from the configured `price_sources` rather than from
//! `Exchange::ALL` — an unused provider never has to have a placeholder key.

use std::collections::HashMap;
use std::sync::Arc;

use oracle_adapters::exchange::{
    AlphavantageAdapter, BinanceAdapter, BinanceUsAdapter, BitMartAdapter, BitcointradeAdapter,
    BitgetAdapter, BitstampAdapter, BittrexAdapter, CoinbaseAdapter, GeminiAdapter, KrakenAdapter,
    KuCoinAdapter, OkCoinAdapter, OkxAdapter, OpenExchangeRatesAdapter, WhitebitAdapter,
    XigniteAdapter,
};
use oracle_adapters::ExchangeAdapter;
use oracle_config::OracleConfig;
use oracle_types::Exchange;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("price source references {0}, but no API key is configured for it")]
    MissingApiKey(Exchange),
}

/// Builds one adapter instance per distinct exchange referenced across every
/// leg of every configured price source.
pub fn build_registry(
    config: &OracleConfig,
) -> Result<HashMap<Exchange, Arc<dyn ExchangeAdapter>>, RegistryError> {
    let needed: std::collections::HashSet<Exchange> = config
        .price_sources
        .iter()
        .flat_map(|source| source.legs.iter().map(|leg| leg.exchange))
        .collect();

    let mut registry: HashMap<Exchange, Arc<dyn ExchangeAdapter>> = HashMap::new();
    for exchange in needed {
        let adapter = build_adapter(exchange, config)?;
        registry.insert(exchange, adapter);
    }
    Ok(registry)
}

fn build_adapter(
    exchange: Exchange,
    config: &OracleConfig,
) -> Result<Arc<dyn ExchangeAdapter>, RegistryError> {
    Ok(match exchange {
        Exchange::Binance => Arc::new(BinanceAdapter::new()),
        Exchange::BinanceUs => Arc::new(BinanceUsAdapter::new()),
        Exchange::Bittrex => Arc::new(BittrexAdapter::new()),
        Exchange::Coinbase => Arc::new(CoinbaseAdapter::new()),
        Exchange::Bitstamp => Arc::new(BitstampAdapter::new()),
        Exchange::KuCoin => Arc::new(KuCoinAdapter::new()),
        Exchange::Kraken => Arc::new(KrakenAdapter::new()),
        Exchange::Gemini => Arc::new(GeminiAdapter::new()),
        Exchange::Okx => Arc::new(OkxAdapter::new()),
        Exchange::OkCoin => Arc::new(OkCoinAdapter::new()),
        Exchange::BitMart => Arc::new(BitMartAdapter::new()),
        Exchange::Bitget => Arc::new(BitgetAdapter::new()),
        Exchange::Whitebit => Arc::new(WhitebitAdapter::new()),
        Exchange::Bitcointrade => Arc::new(BitcointradeAdapter::new()),
        Exchange::Alphavantage => Arc::new(AlphavantageAdapter::new(
            config
                .alphavantage_api_key
                .clone()
                .ok_or(RegistryError::MissingApiKey(exchange))?,
        )),
        Exchange::Xignite => Arc::new(XigniteAdapter::new(
            config
                .xignite_api_key
                .clone()
                .ok_or(RegistryError::MissingApiKey(exchange))?,
        )),
        Exchange::OpenExchangeRates => Arc::new(OpenExchangeRatesAdapter::new(
            config
                .open_exchange_rates_api_key
                .clone()
                .ok_or(RegistryError::MissingApiKey(exchange))?,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_config::{AggregationMethod, ReportStrategy, WalletType};
    use oracle_types::{Currency, CurrencyPair, PriceSourceConfig, PriceSourceLeg, ReportedPair};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn config_with_sources(legs: Vec<PriceSourceLeg>) -> OracleConfig {
        OracleConfig {
            currency_pair: ReportedPair::CeloUsd,
            report_strategy: ReportStrategy::TimerBased,
            wallet_type: WalletType::PrivateKey,
            azure_key_vault_name: None,
            http_rpc_provider_url: "http://localhost:8545".to_string(),
            ws_rpc_provider_url: None,
            prometheus_port: 9090,
            aggregation_scaling_rate: dec!(0.5),
            aggregation_method: AggregationMethod::MidPrices,
            unused_oracle_addresses: Vec::new(),
            report_target_override: None,
            price_sources: vec![PriceSourceConfig::new(legs).unwrap()],
            minimum_price_sources: 1,
            fetch_frequency_ms: 5_000,
            aggregation_window_duration_ms: 300_000,
            api_request_timeout_ms: 5_000,
            max_percentage_deviation: dec!(0.1),
            max_percentage_bid_ask_spread: dec!(0.1),
            max_source_weight_share: dec!(0.4),
            min_aggregated_volume: dec!(0),
            max_no_trade_duration_ms: 600_000,
            max_clock_skew_ms: 30_000,
            report_frequency_ms: 300_000,
            report_offset_ms: 0,
            report_minimum_ms: 5_000,
            remove_expired_frequency_ms: 3_600_000,
            max_block_timestamp_age_ms: 60_000,
            target_max_heartbeat_period_ms: 300_000,
            min_report_price_change_threshold: dec!(0.005),
            circuit_breaker_price_change_threshold_min: dec!(0.1),
            circuit_breaker_price_change_threshold_max: dec!(0.25),
            circuit_breaker_price_change_threshold_time_multiplier: dec!(600),
            circuit_breaker_duration_ms: 3_600_000,
            transaction_retry_limit: 3,
            transaction_retry_gas_price_multiplier: dec!(0.1),
            gas_price_multiplier_cap: dec!(2.0),
            cert_refresh_url: None,
            cert_refresh_interval: Duration::from_secs(3600),
            alphavantage_api_key: None,
            xignite_api_key: None,
            open_exchange_rates_api_key: None,
        }
    }

    fn leg(exchange: Exchange) -> PriceSourceLeg {
        PriceSourceLeg {
            exchange,
            pair: CurrencyPair::new(Currency::Celo, Currency::Usd).unwrap(),
            invert: false,
            ignore_volume: false,
        }
    }

    #[test]
    fn builds_one_adapter_per_distinct_exchange() {
        let config = config_with_sources(vec![leg(Exchange::Kraken), leg(Exchange::Coinbase)]);
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains_key(&Exchange::Kraken));
        assert!(registry.contains_key(&Exchange::Coinbase));
    }

    #[test]
    fn missing_fx_api_key_is_reported_rather_than_panicking() {
        let config = config_with_sources(vec![leg(Exchange::Alphavantage)]);
        let err = build_registry(&config).unwrap_err();
        assert!(matches!(err, RegistryError::MissingApiKey(Exchange::Alphavantage)));
    }
}
