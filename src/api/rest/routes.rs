use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::place::GeoPoint;
use crate::models::route::RouteResult;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/routes", post(compute_route))
}

#[derive(Deserialize)]
pub struct RouteRequest {
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
}

async fn compute_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<RouteResult>, AppError> {
    let pickup = payload.pickup.validated()?;
    let dropoff = payload.dropoff.validated()?;

    Ok(Json(state.routing.route(&pickup, &dropoff).await))
}
