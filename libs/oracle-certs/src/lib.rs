//! Certificate pinning: a mapping from `Exchange` to the pinned SHA-256
//! fingerprint of that venue's current TLS leaf certificate.

pub mod fingerprint;
pub mod manager;

pub use fingerprint::sha256_hex_fingerprint;
pub use manager::{CertificateManager, CertificateMap, CertificatePinError, CertificateRefreshError};
