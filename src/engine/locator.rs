use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::place::GeoPoint;

pub const CURRENT_LOCATION_LABEL: &str = "Current location";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateError {
    #[error("geolocation is not supported on this device")]
    Unsupported,

    #[error("geolocation permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    Unavailable,

    #[error("geolocation timed out")]
    Timeout,
}

impl LocateError {
    /// Rider-facing message recorded on the session.
    pub const fn notice(self) -> &'static str {
        match self {
            LocateError::Unsupported => "Geolocation not supported by your browser",
            LocateError::PermissionDenied | LocateError::Unavailable | LocateError::Timeout => {
                "Unable to retrieve location. Enter manually."
            }
        }
    }
}

/// A one-shot source of the rider's current position.
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn current_position(&self) -> Result<GeoPoint, LocateError>;
}

/// Position (or failure) already obtained by the rider's device and
/// reported to the service.
#[derive(Debug, Clone)]
pub struct ReportedPosition(pub Result<GeoPoint, LocateError>);

#[async_trait]
impl DeviceLocator for ReportedPosition {
    async fn current_position(&self) -> Result<GeoPoint, LocateError> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::LocateError;

    #[test]
    fn unsupported_has_its_own_notice() {
        assert_eq!(
            LocateError::Unsupported.notice(),
            "Geolocation not supported by your browser"
        );
        assert_eq!(LocateError::Timeout.notice(), LocateError::PermissionDenied.notice());
    }

    #[test]
    fn errors_deserialize_from_snake_case() {
        let err: LocateError = serde_json::from_str("\"permission_denied\"").unwrap();
        assert_eq!(err, LocateError::PermissionDenied);
    }
}
