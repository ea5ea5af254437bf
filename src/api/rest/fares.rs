use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::engine::fare::estimate;
use crate::error::AppError;
use crate::models::fare::FareEstimate;
use crate::models::vehicle::{PAYMENTS, PaymentMethod, VEHICLES, VehicleClass};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", get(list_vehicles))
        .route("/payments", get(list_payments))
        .route("/fares/estimate", post(estimate_fare))
}

#[derive(Deserialize)]
pub struct FareRequest {
    pub vehicle: String,
    pub distance_km: f64,
    pub duration_min: f64,
}

#[derive(Serialize)]
pub struct FareQuote {
    #[serde(flatten)]
    pub estimate: FareEstimate,
    pub display: String,
}

async fn list_vehicles() -> Json<&'static [VehicleClass]> {
    Json(VEHICLES)
}

async fn list_payments() -> Json<&'static [PaymentMethod]> {
    Json(PAYMENTS)
}

async fn estimate_fare(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FareRequest>,
) -> Result<Json<FareQuote>, AppError> {
    for (name, value) in [
        ("distance_km", payload.distance_km),
        ("duration_min", payload.duration_min),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::BadRequest(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }

    let estimate = estimate(&payload.vehicle, payload.distance_km, payload.duration_min)
        .ok_or_else(|| AppError::BadRequest(format!("unknown vehicle: {}", payload.vehicle)))?;

    state
        .metrics
        .fare_estimates_total
        .with_label_values(&["calculator"])
        .inc();

    Ok(Json(FareQuote {
        display: estimate.display_total(),
        estimate,
    }))
}
