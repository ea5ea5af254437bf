use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::place::{GeoPoint, PlaceSuggestion};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/places/search", get(search_places))
        .route("/places/reverse", get(reverse_place))
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct ReverseParams {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Serialize)]
pub struct ReverseResponse {
    pub lat: f64,
    pub lng: f64,
    pub label: Option<String>,
}

async fn search_places(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<PlaceSuggestion>> {
    Json(state.geocoding.search(&params.q).await)
}

/// A missing label is a normal outcome, not an error.
async fn reverse_place(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseParams>,
) -> Result<Json<ReverseResponse>, AppError> {
    let point = GeoPoint::checked(params.lat, params.lng, None)?;
    let label = state.geocoding.reverse_lookup(&point).await;

    Ok(Json(ReverseResponse {
        lat: point.lat,
        lng: point.lng,
        label,
    }))
}
