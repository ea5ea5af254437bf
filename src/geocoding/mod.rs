//! Place search and reverse lookup.
//!
//! [`GeocodingClient`] is what the rest of the crate talks to: it never
//! fails, turning every provider error into "no suggestions" or "no label".
//! Providers implement [`Geocoder`] and report errors honestly.

pub mod nominatim;
pub mod suggestions;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::place::{GeoPoint, PlaceSuggestion};
use crate::observability::metrics::Metrics;

pub use nominatim::NominatimGeocoder;

/// Queries shorter than this (after trimming) never reach the network.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("geocoding transport failed: {0}")]
    Transport(String),

    #[error("geocoding service answered HTTP {0}")]
    Status(u16),

    #[error("malformed geocoding response: {0}")]
    Malformed(String),

    #[error("no place found at {lat},{lng}")]
    NoLabel { lat: f64, lng: f64 },
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodingError>;

    async fn reverse(&self, point: &GeoPoint) -> Result<String, GeocodingError>;
}

pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

#[derive(Clone)]
pub struct GeocodingClient {
    provider: Arc<dyn Geocoder>,
    metrics: Metrics,
}

impl GeocodingClient {
    pub fn new(provider: Arc<dyn Geocoder>, metrics: Metrics) -> Self {
        Self { provider, metrics }
    }

    pub async fn search(&self, query: &str) -> Vec<PlaceSuggestion> {
        if !is_searchable(query) {
            debug!(query, "query too short; skipping place search");
            return Vec::new();
        }

        match self.provider.search(query.trim()).await {
            Ok(suggestions) => {
                self.record("search", "ok");
                suggestions
            }
            Err(err) => {
                self.record("search", "error");
                warn!(error = %err, query, "place search failed; returning no suggestions");
                Vec::new()
            }
        }
    }

    pub async fn reverse_lookup(&self, point: &GeoPoint) -> Option<String> {
        match self.provider.reverse(point).await {
            Ok(label) => {
                self.record("reverse", "ok");
                Some(label)
            }
            Err(err) => {
                self.record("reverse", "error");
                warn!(error = %err, lat = point.lat, lng = point.lng, "reverse lookup failed");
                None
            }
        }
    }

    fn record(&self, operation: &str, outcome: &str) {
        self.metrics
            .geocoding_requests_total
            .with_label_values(&[operation, outcome])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::{Geocoder, GeocodingClient, GeocodingError, is_searchable};
    use crate::models::place::{GeoPoint, PlaceSuggestion};
    use crate::observability::metrics::Metrics;

    #[derive(Default)]
    struct CountingGeocoder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GeocodingError::Status(503));
            }
            Ok(vec![PlaceSuggestion {
                id: 1,
                label: query.to_string(),
                lat: 23.8,
                lng: 90.4,
            }])
        }

        async fn reverse(&self, point: &GeoPoint) -> Result<String, GeocodingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GeocodingError::NoLabel {
                    lat: point.lat,
                    lng: point.lng,
                });
            }
            Ok("Gulshan".to_string())
        }
    }

    #[test]
    fn short_queries_are_not_searchable() {
        assert!(!is_searchable(""));
        assert!(!is_searchable(" a "));
        assert!(is_searchable("ab"));
        assert!(is_searchable("  Uttara "));
    }

    #[tokio::test]
    async fn short_query_skips_the_provider() {
        let provider = Arc::new(CountingGeocoder::default());
        let client = GeocodingClient::new(provider.clone(), Metrics::new());

        assert!(client.search(" x ").await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_errors_degrade_to_empty_results() {
        let provider = Arc::new(CountingGeocoder {
            fail: true,
            ..Default::default()
        });
        let client = GeocodingClient::new(provider.clone(), Metrics::new());

        assert!(client.search("Banani").await.is_empty());
        assert!(client.reverse_lookup(&GeoPoint::new(23.79, 90.40)).await.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn search_trims_query_before_forwarding() {
        let provider = Arc::new(CountingGeocoder::default());
        let client = GeocodingClient::new(provider, Metrics::new());

        let results = client.search("  Banani  ").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "Banani");
    }
}
