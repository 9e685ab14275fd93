use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStrategy {
    BlockBased,
    TimerBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletType {
    PrivateKey,
    AzureHsm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMethod {
    MidPrices,
    Trades,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {name}")]
pub struct InvalidEnumValue {
    pub name: &'static str,
    pub value: String,
}

impl FromStr for ReportStrategy {
    type Err = InvalidEnumValue;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BLOCK_BASED" => Ok(ReportStrategy::BlockBased),
            "TIMER_BASED" => Ok(ReportStrategy::TimerBased),
            _ => Err(InvalidEnumValue {
                name: "REPORT_STRATEGY",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for WalletType {
    type Err = InvalidEnumValue;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PRIVATE_KEY" => Ok(WalletType::PrivateKey),
            "AZURE_HSM" => Ok(WalletType::AzureHsm),
            _ => Err(InvalidEnumValue {
                name: "WALLET_TYPE",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for AggregationMethod {
    type Err = InvalidEnumValue;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MIDPRICES" => Ok(AggregationMethod::MidPrices),
            "TRADES" => Ok(AggregationMethod::Trades),
            _ => Err(InvalidEnumValue {
                name: "AGGREGATION_METHOD",
                value: s.to_string(),
            }),
        }
    }
}
