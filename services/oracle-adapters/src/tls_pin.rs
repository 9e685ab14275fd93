//! Leaf-certificate fingerprint extraction for certificate pinning.
//!
//! The fetch pipeline needs the SHA-256 fingerprint of the TLS leaf
//! certificate a venue presents *before* it decides whether to trust the
//! connection, so ordinary root-store validation (which only tells you
//! "some CA vouches for this") isn't the question being asked. We run a
//! standalone TLS handshake with a verifier that accepts any chain and just
//! hands back the leaf certificate bytes; the actual trust decision is the
//! fingerprint comparison in `oracle_certs::CertificateManager::verify`.

use std::sync::Arc;

use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, ServerName};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use oracle_certs::sha256_hex_fingerprint;

#[derive(Debug, thiserror::Error)]
pub enum TlsPinError {
    #[error("failed to resolve TLS server name for {0}")]
    InvalidServerName(String),
    #[error("TCP connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("TLS handshake with {0} failed: {1}")]
    Handshake(String, std::io::Error),
    #[error("server presented no certificate")]
    NoCertificate,
}

/// Accepts any certificate chain; used only to observe the leaf certificate
/// bytes so we can hash them. The comparison against the pinned fingerprint
/// happens one layer up, after this returns.
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

/// Connects to `host:port`, completes a TLS handshake, and returns the
/// SHA-256 hex fingerprint of the leaf certificate the peer presented.
pub async fn observe_leaf_fingerprint(host: &str, port: u16) -> Result<String, TlsPinError> {
    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let server_name = ServerName::try_from(host)
        .map_err(|_| TlsPinError::InvalidServerName(host.to_string()))?;

    let tcp = TcpStream::connect((host, port))
        .await
        .map_err(|source| TlsPinError::Connect {
            host: host.to_string(),
            port,
            source,
        })?;

    let tls_stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| TlsPinError::Handshake(host.to_string(), e))?;

    let (_, session) = tls_stream.get_ref();
    let leaf = session
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or(TlsPinError::NoCertificate)?;

    Ok(sha256_hex_fingerprint(&leaf.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_server_name_is_rejected_before_any_io() {
        // DNS names must not contain raw spaces; exercised synchronously
        // since `ServerName::try_from` itself is not async.
        assert!(ServerName::try_from("not a hostname").is_err());
    }
}
