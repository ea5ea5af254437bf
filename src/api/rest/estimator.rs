use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use tracing::debug;

use crate::engine::standalone::{CatalogPlace, StandaloneEstimate, StandaloneQuery};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/estimator/places", get(list_places))
        .route("/estimator/estimate", post(estimate))
}

async fn list_places(State(state): State<Arc<AppState>>) -> Json<&'static [CatalogPlace]> {
    Json(state.estimator.places())
}

async fn estimate(
    State(state): State<Arc<AppState>>,
    Json(query): Json<StandaloneQuery>,
) -> Result<Json<StandaloneEstimate>, AppError> {
    let estimate = state.estimator.estimate(&query)?;

    state
        .metrics
        .fare_estimates_total
        .with_label_values(&["standalone"])
        .inc();
    debug!(
        vehicle = estimate.vehicle_type.name(),
        distance_km = estimate.distance_km,
        total = estimate.total,
        "standalone fare estimated"
    );

    Ok(Json(estimate))
}
