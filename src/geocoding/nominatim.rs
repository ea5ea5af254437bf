use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::geocoding::{Geocoder, GeocodingError};
use crate::models::place::{GeoPoint, PlaceSuggestion};

const SEARCH_LIMIT: &str = "8";

/// Nominatim-compatible geocoder (`/search` and `/reverse`, `jsonv2`).
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodingError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|err| GeocodingError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T, GeocodingError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|err| GeocodingError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodingError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| GeocodingError::Malformed(err.to_string()))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodingError> {
        let params = [
            ("format", "jsonv2".to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
            ("addressdetails", "1".to_string()),
            ("q", query.to_string()),
        ];

        let results: Vec<SearchHit> = self.get("/search", &params).await?;
        let total = results.len();

        let suggestions: Vec<PlaceSuggestion> =
            results.into_iter().filter_map(SearchHit::into_suggestion).collect();

        if suggestions.len() < total {
            debug!(
                dropped = total - suggestions.len(),
                "dropped candidates with unparseable coordinates"
            );
        }

        Ok(suggestions)
    }

    #[instrument(skip(self))]
    async fn reverse(&self, point: &GeoPoint) -> Result<String, GeocodingError> {
        let params = [
            ("format", "jsonv2".to_string()),
            ("lat", point.lat.to_string()),
            ("lon", point.lng.to_string()),
        ];

        let hit: ReverseHit = self.get("/reverse", &params).await?;

        hit.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(GeocodingError::NoLabel {
                lat: point.lat,
                lng: point.lng,
            })
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    place_id: u64,
    display_name: String,
    lat: String,
    lon: String,
}

impl SearchHit {
    fn into_suggestion(self) -> Option<PlaceSuggestion> {
        let lat = self.lat.parse::<f64>().ok()?;
        let lng = self.lon.parse::<f64>().ok()?;

        Some(PlaceSuggestion {
            id: self.place_id,
            label: self.display_name,
            lat,
            lng,
        })
    }
}

/// Nominatim answers `{"error": "Unable to geocode"}` with HTTP 200 for
/// points it cannot resolve, so every field is optional.
#[derive(Debug, Deserialize)]
struct ReverseHit {
    display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{ReverseHit, SearchHit};

    #[test]
    fn search_hit_parses_string_coordinates() {
        let json = r#"[{"place_id": 42, "display_name": "Uttara, Dhaka", "lat": "23.8759", "lon": "90.3795"}]"#;
        let hits: Vec<SearchHit> = serde_json::from_str(json).unwrap();
        let suggestion = hits.into_iter().next().unwrap().into_suggestion().unwrap();

        assert_eq!(suggestion.id, 42);
        assert_eq!(suggestion.label, "Uttara, Dhaka");
        assert!((suggestion.lat - 23.8759).abs() < 1e-9);
        assert!((suggestion.lng - 90.3795).abs() < 1e-9);
    }

    #[test]
    fn search_hit_with_bad_coordinates_is_dropped() {
        let hit = SearchHit {
            place_id: 1,
            display_name: "Nowhere".to_string(),
            lat: "north".to_string(),
            lon: "90.0".to_string(),
        };
        assert!(hit.into_suggestion().is_none());
    }

    #[test]
    fn reverse_error_body_has_no_label() {
        let hit: ReverseHit = serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert!(hit.display_name.is_none());
    }
}
