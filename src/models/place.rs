use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A coordinate pair with an optional human-readable label.
///
/// Points are never edited after construction; re-selecting an endpoint
/// replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            label: None,
        }
    }

    pub fn labelled(lat: f64, lng: f64, label: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            label: Some(label.into()),
        }
    }

    /// Builds a point from untrusted input, rejecting out-of-range or
    /// non-finite coordinates.
    pub fn checked(lat: f64, lng: f64, label: Option<String>) -> Result<Self, AppError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::BadRequest(format!(
                "latitude must be within [-90, 90], got {lat}"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::BadRequest(format!(
                "longitude must be within [-180, 180], got {lng}"
            )));
        }

        Ok(Self { lat, lng, label })
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    /// Re-validates a deserialized point.
    pub fn validated(self) -> Result<Self, AppError> {
        Self::checked(self.lat, self.lng, self.label)
    }
}

/// One candidate returned by a place search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub id: u64,
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<PlaceSuggestion> for GeoPoint {
    fn from(suggestion: PlaceSuggestion) -> Self {
        GeoPoint::labelled(suggestion.lat, suggestion.lng, suggestion.label)
    }
}
