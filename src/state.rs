use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::ride_request::RideRequest;
use crate::engine::standalone::StandaloneEstimator;
use crate::error::AppError;
use crate::geocoding::{Geocoder, GeocodingClient, NominatimGeocoder};
use crate::models::ride::SubmittedRide;
use crate::observability::metrics::Metrics;
use crate::routing::{OsrmRouter, RouteProvider, RoutingClient};

#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub search_debounce: Duration,
    pub geolocation_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            geolocation_timeout: Duration::from_secs(8),
        }
    }
}

/// External collaborators the service talks to.
pub struct Providers {
    pub geocoder: Arc<dyn Geocoder>,
    pub router: Arc<dyn RouteProvider>,
    pub fallback_speed_mps: f64,
    pub timings: Timings,
}

impl Providers {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let geocoder = NominatimGeocoder::new(
            config.geocoder_base_url.clone(),
            &config.user_agent,
            config.http_timeout,
        )
        .map_err(|err| AppError::Internal(format!("geocoder setup failed: {err}")))?;

        let router = OsrmRouter::new(
            config.router_base_url.clone(),
            &config.user_agent,
            config.http_timeout,
        )
        .map_err(|err| AppError::Internal(format!("router setup failed: {err}")))?;

        Ok(Self {
            geocoder: Arc::new(geocoder),
            router: Arc::new(router),
            fallback_speed_mps: config.fallback_speed_mps,
            timings: Timings {
                search_debounce: config.search_debounce,
                geolocation_timeout: config.geolocation_timeout,
            },
        })
    }
}

pub struct AppState {
    pub sessions: DashMap<Uuid, RideRequest>,
    pub rides: DashMap<Uuid, SubmittedRide>,
    pub geocoding: GeocodingClient,
    pub routing: RoutingClient,
    pub estimator: StandaloneEstimator,
    pub timings: Timings,
    pub ride_tx: mpsc::Sender<SubmittedRide>,
    pub ride_events_tx: broadcast::Sender<SubmittedRide>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        providers: Providers,
        ride_queue_size: usize,
        event_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<SubmittedRide>) {
        let (ride_tx, ride_rx) = mpsc::channel(ride_queue_size);
        let (ride_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let metrics = Metrics::new();

        (
            Self {
                sessions: DashMap::new(),
                rides: DashMap::new(),
                geocoding: GeocodingClient::new(providers.geocoder, metrics.clone()),
                routing: RoutingClient::new(
                    providers.router,
                    providers.fallback_speed_mps,
                    metrics.clone(),
                ),
                estimator: StandaloneEstimator::default(),
                timings: providers.timings,
                ride_tx,
                ride_events_tx,
                metrics,
            },
            ride_rx,
        )
    }
}
