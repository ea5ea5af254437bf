//! Driving routes with a straight-line fallback.
//!
//! [`RoutingClient::route`] always returns a [`RouteResult`]. When the
//! provider fails for any reason the result is synthesized from the
//! great-circle distance and an assumed average speed.

pub mod osrm;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::geo::haversine_m;
use crate::models::place::GeoPoint;
use crate::models::route::{RouteResult, RouteSource};
use crate::observability::metrics::Metrics;

pub use osrm::OsrmRouter;

/// Roughly 36 km/h in city traffic.
pub const DEFAULT_FALLBACK_SPEED_MPS: f64 = 10.0;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing transport failed: {0}")]
    Transport(String),

    #[error("routing service answered HTTP {0}")]
    Status(u16),

    #[error("routing service reported {0}")]
    Service(String),

    #[error("no route between the requested points")]
    NoRoute,

    #[error("malformed routing response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn driving_route(
        &self,
        pickup: &GeoPoint,
        dropoff: &GeoPoint,
    ) -> Result<RouteResult, RoutingError>;
}

pub fn straight_line_route(pickup: &GeoPoint, dropoff: &GeoPoint, speed_mps: f64) -> RouteResult {
    let distance_meters = haversine_m(pickup, dropoff);

    RouteResult {
        distance_meters,
        duration_sec: distance_meters / speed_mps,
        polyline: vec![pickup.clone(), dropoff.clone()],
        source: RouteSource::StraightLine,
    }
}

#[derive(Clone)]
pub struct RoutingClient {
    provider: Arc<dyn RouteProvider>,
    fallback_speed_mps: f64,
    metrics: Metrics,
}

impl RoutingClient {
    pub fn new(provider: Arc<dyn RouteProvider>, fallback_speed_mps: f64, metrics: Metrics) -> Self {
        Self {
            provider,
            fallback_speed_mps,
            metrics,
        }
    }

    pub async fn route(&self, pickup: &GeoPoint, dropoff: &GeoPoint) -> RouteResult {
        let start = Instant::now();

        let route = match self.provider.driving_route(pickup, dropoff).await {
            Ok(route) => {
                debug!(
                    distance_m = route.distance_meters,
                    duration_s = route.duration_sec,
                    points = route.polyline.len(),
                    "route fetched"
                );
                route
            }
            Err(err) => {
                warn!(error = %err, "routing failed; using straight-line estimate");
                straight_line_route(pickup, dropoff, self.fallback_speed_mps)
            }
        };

        let source = match route.source {
            RouteSource::Routed => "routed",
            RouteSource::StraightLine => "straight_line",
        };
        self.metrics
            .route_requests_total
            .with_label_values(&[source])
            .inc();
        self.metrics
            .route_latency_seconds
            .with_label_values(&[source])
            .observe(start.elapsed().as_secs_f64());

        route
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{RouteProvider, RoutingClient, RoutingError, straight_line_route};
    use crate::geo::haversine_km;
    use crate::models::place::GeoPoint;
    use crate::models::route::{RouteResult, RouteSource};
    use crate::observability::metrics::Metrics;

    struct Unreachable;

    #[async_trait]
    impl RouteProvider for Unreachable {
        async fn driving_route(
            &self,
            _pickup: &GeoPoint,
            _dropoff: &GeoPoint,
        ) -> Result<RouteResult, RoutingError> {
            Err(RoutingError::Transport("connection refused".to_string()))
        }
    }

    fn dhaka() -> (GeoPoint, GeoPoint) {
        (GeoPoint::new(23.8103, 90.4125), GeoPoint::new(23.7939, 90.4043))
    }

    #[test]
    fn straight_line_uses_haversine_and_speed() {
        let (pickup, dropoff) = dhaka();
        let route = straight_line_route(&pickup, &dropoff, 10.0);

        let expected_m = haversine_km(&pickup, &dropoff) * 1000.0;
        assert!((route.distance_meters - expected_m).abs() < 1e-6);
        assert!((route.duration_sec - expected_m / 10.0).abs() < 1e-6);
        assert_eq!(route.polyline, vec![pickup, dropoff]);
        assert_eq!(route.source, RouteSource::StraightLine);
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back() {
        let (pickup, dropoff) = dhaka();
        let client = RoutingClient::new(Arc::new(Unreachable), 10.0, Metrics::new());

        let route = client.route(&pickup, &dropoff).await;

        assert_eq!(route.polyline.len(), 2);
        assert_eq!(route.polyline[0], pickup);
        assert_eq!(route.polyline[1], dropoff);
        assert_eq!(route.source, RouteSource::StraightLine);
        assert!((route.distance_meters - haversine_km(&pickup, &dropoff) * 1000.0).abs() < 1e-6);
    }
}
