//! The on-chain submission boundary (spec §1, §6.2): an external collaborator
//! this core only calls through a small trait. A real implementation wires
//! an RPC client and wallet/signer, both explicitly out of scope (spec §1);
//! `NullChainClient` is the test double every reporter test drives against.

use async_trait::async_trait;
use oracle_types::ReportedPair;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct ReportSubmission {
    pub reporter: String,
    pub pair: ReportedPair,
    /// Price expressed as `numerator / denominator`, the fixed-point form
    /// the sorted-oracle contract's `report` entry point expects.
    pub numerator: u128,
    pub denominator: u128,
    /// Sorted-oracle insertion neighbors (spec §6.2, glossary): the reports
    /// immediately below and above this value in the contract's sorted
    /// linked list, found via `ChainClient::find_neighbors`.
    pub lesser_neighbors: Vec<String>,
    pub greater_neighbors: Vec<String>,
}

impl ReportSubmission {
    pub fn value(&self) -> Decimal {
        Decimal::from(self.numerator) / Decimal::from(self.denominator.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct Neighbors {
    pub lesser: Vec<String>,
    pub greater: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    #[error("submission reverted or was rejected: {0}")]
    Rejected(String),
    #[error("transport error talking to chain client: {0}")]
    Transport(String),
}

/// What the reporter needs from a blockchain client library binding, kept
/// deliberately small — wallet signing, nonce management, and gas
/// estimation all live behind this one call per spec §1's scope boundary.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn find_neighbors(&self, pair: ReportedPair, value: Decimal) -> Result<Neighbors, ChainClientError>;

    /// Submits at `gas_price_multiplier` times the client's base gas price;
    /// the retry loop in `retry::submit_with_retry` owns the multiplier
    /// schedule, this call just applies whatever it's given.
    async fn submit_report(
        &self,
        submission: &ReportSubmission,
        gas_price_multiplier: Decimal,
    ) -> Result<(), ChainClientError>;

    async fn remove_expired(&self, pair: ReportedPair) -> Result<(), ChainClientError>;

    async fn latest_block_timestamp_ms(&self) -> Result<i64, ChainClientError>;
}

/// Accepts every submission; used in tests and as a startup placeholder
/// before a real chain binding is wired in.
pub struct NullChainClient;

#[async_trait]
impl ChainClient for NullChainClient {
    async fn find_neighbors(&self, _pair: ReportedPair, _value: Decimal) -> Result<Neighbors, ChainClientError> {
        Ok(Neighbors { lesser: Vec::new(), greater: Vec::new() })
    }

    async fn submit_report(
        &self,
        _submission: &ReportSubmission,
        _gas_price_multiplier: Decimal,
    ) -> Result<(), ChainClientError> {
        Ok(())
    }

    async fn remove_expired(&self, _pair: ReportedPair) -> Result<(), ChainClientError> {
        Ok(())
    }

    async fn latest_block_timestamp_ms(&self) -> Result<i64, ChainClientError> {
        Ok(0)
    }
}
