use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::models::place::GeoPoint;
use crate::models::route::{RouteResult, RouteSource};
use crate::routing::{RouteProvider, RoutingError};

/// OSRM-compatible routing backend (`/route/v1/driving`).
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    client: Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|err| RoutingError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn route_url(&self, pickup: &GeoPoint, dropoff: &GeoPoint) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, pickup.lng, pickup.lat, dropoff.lng, dropoff.lat
        )
    }
}

#[async_trait]
impl RouteProvider for OsrmRouter {
    #[instrument(skip_all)]
    async fn driving_route(
        &self,
        pickup: &GeoPoint,
        dropoff: &GeoPoint,
    ) -> Result<RouteResult, RoutingError> {
        let response = self
            .client
            .get(self.route_url(pickup, dropoff))
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await
            .map_err(|err| RoutingError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status.as_u16()));
        }

        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|err| RoutingError::Malformed(err.to_string()))?;

        if body.code != "Ok" {
            return Err(RoutingError::Service(body.code));
        }

        let route = body.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

        Ok(RouteResult {
            distance_meters: route.distance,
            duration_sec: route.duration,
            polyline: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| GeoPoint::new(lat, lng))
                .collect(),
            source: RouteSource::Routed,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: LineString,
}

#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{OsrmResponse, OsrmRouter};
    use crate::models::place::GeoPoint;

    #[test]
    fn route_url_orders_coordinates_lng_first() {
        let router = OsrmRouter::new("http://osrm.local/", "test", Duration::from_secs(1)).unwrap();
        let url = router.route_url(
            &GeoPoint::new(23.8103, 90.4125),
            &GeoPoint::new(23.7939, 90.4043),
        );
        assert_eq!(
            url,
            "http://osrm.local/route/v1/driving/90.4125,23.8103;90.4043,23.7939"
        );
    }

    #[test]
    fn no_route_body_parses_with_empty_routes() {
        let body: OsrmResponse =
            serde_json::from_str(r#"{"code": "NoRoute", "message": "Impossible route"}"#).unwrap();
        assert_eq!(body.code, "NoRoute");
        assert!(body.routes.is_empty());
    }
}
