use sha2::{Digest, Sha256};

/// Computes the SHA-256 fingerprint of a DER-encoded certificate, formatted
/// as lowercase hex. This is the same representation used by the pinned
/// fingerprint map, so a TLS layer's observed leaf certificate and the
/// configured pin can be compared directly as strings.
pub fn sha256_hex_fingerprint(der_bytes: &[u8]) -> String {
    let digest = Sha256::digest(der_bytes);
    hex::encode(digest)
}
