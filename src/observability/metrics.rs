use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub geocoding_requests_total: IntCounterVec,
    pub route_requests_total: IntCounterVec,
    pub route_latency_seconds: HistogramVec,
    pub fare_estimates_total: IntCounterVec,
    pub stale_results_discarded_total: IntCounterVec,
    pub rides_submitted_total: IntCounter,
    pub rides_in_queue: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let geocoding_requests_total = IntCounterVec::new(
            Opts::new("geocoding_requests_total", "Geocoding calls by operation and outcome"),
            &["operation", "outcome"],
        )
        .expect("valid geocoding_requests_total metric");

        let route_requests_total = IntCounterVec::new(
            Opts::new("route_requests_total", "Route computations by result source"),
            &["source"],
        )
        .expect("valid route_requests_total metric");

        let route_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "route_latency_seconds",
                "Latency of route computation in seconds, fallback included",
            ),
            &["source"],
        )
        .expect("valid route_latency_seconds metric");

        let fare_estimates_total = IntCounterVec::new(
            Opts::new("fare_estimates_total", "Fare estimates by pricing surface"),
            &["surface"],
        )
        .expect("valid fare_estimates_total metric");

        let stale_results_discarded_total = IntCounterVec::new(
            Opts::new(
                "stale_results_discarded_total",
                "Async results dropped because a newer request superseded them",
            ),
            &["kind"],
        )
        .expect("valid stale_results_discarded_total metric");

        let rides_submitted_total =
            IntCounter::new("rides_submitted_total", "Ride requests handed to dispatch")
                .expect("valid rides_submitted_total metric");

        let rides_in_queue = IntGauge::new("rides_in_queue", "Ride requests waiting for dispatch")
            .expect("valid rides_in_queue metric");

        registry
            .register(Box::new(geocoding_requests_total.clone()))
            .expect("register geocoding_requests_total");
        registry
            .register(Box::new(route_requests_total.clone()))
            .expect("register route_requests_total");
        registry
            .register(Box::new(route_latency_seconds.clone()))
            .expect("register route_latency_seconds");
        registry
            .register(Box::new(fare_estimates_total.clone()))
            .expect("register fare_estimates_total");
        registry
            .register(Box::new(stale_results_discarded_total.clone()))
            .expect("register stale_results_discarded_total");
        registry
            .register(Box::new(rides_submitted_total.clone()))
            .expect("register rides_submitted_total");
        registry
            .register(Box::new(rides_in_queue.clone()))
            .expect("register rides_in_queue");

        Self {
            registry,
            geocoding_requests_total,
            route_requests_total,
            route_latency_seconds,
            fare_estimates_total,
            stale_results_discarded_total,
            rides_submitted_total,
            rides_in_queue,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
