use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::locator::{LocateError, ReportedPosition};
use crate::engine::orchestrator::{self, SuggestionsView};
use crate::engine::ride_request::{Endpoint, RideRequestView};
use crate::error::AppError;
use crate::models::place::GeoPoint;
use crate::models::ride::SubmittedRide;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rides/sessions", post(create_session))
        .route("/rides/sessions/:id", get(get_session).delete(discard_session))
        .route("/rides/sessions/:id/locate", post(locate))
        .route("/rides/sessions/:id/points", post(select_point))
        .route("/rides/sessions/:id/pickup", put(set_pickup))
        .route("/rides/sessions/:id/dropoff", put(set_dropoff))
        .route("/rides/sessions/:id/suggestions", get(suggestions))
        .route("/rides/sessions/:id/suggestions/choose", post(choose_suggestion))
        .route("/rides/sessions/:id/vehicle", put(set_vehicle))
        .route("/rides/sessions/:id/payment", put(set_payment))
        .route("/rides/sessions/:id/notice", delete(dismiss_notice))
        .route("/rides/sessions/:id/submit", post(submit))
        .route("/rides", get(list_rides))
        .route("/rides/:id", get(get_ride))
}

/// What the rider's device reported when asked for its position: either a
/// fix or the reason it could not produce one.
#[derive(Deserialize)]
pub struct LocateReport {
    pub position: Option<GeoPoint>,
    pub error: Option<LocateError>,
}

impl LocateReport {
    fn into_reported(self) -> Result<ReportedPosition, AppError> {
        match (self.position, self.error) {
            (Some(position), None) => Ok(ReportedPosition(Ok(position))),
            (None, Some(error)) => Ok(ReportedPosition(Err(error))),
            _ => Err(AppError::BadRequest(
                "exactly one of position or error must be reported".to_string(),
            )),
        }
    }
}

#[derive(Deserialize)]
pub struct SuggestionParams {
    pub field: Endpoint,
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct SuggestionChoice {
    pub field: Endpoint,
    pub suggestion_id: u64,
}

#[derive(Deserialize)]
pub struct VehicleSelection {
    pub vehicle: String,
}

#[derive(Deserialize)]
pub struct PaymentSelection {
    pub payment: String,
}

/// The device report is optional, but a body that is present must parse.
async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RideRequestView>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Json(orchestrator::create_session(&state, None).await?));
    }

    let report: LocateReport = serde_json::from_slice(&body)
        .map_err(|err| AppError::BadRequest(format!("invalid location report: {err}")))?;
    let reported = report.into_reported()?;
    let view = orchestrator::create_session(&state, Some(&reported)).await?;

    Ok(Json(view))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequestView>, AppError> {
    Ok(Json(orchestrator::view(&state, id)?))
}

async fn discard_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    orchestrator::discard_session(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn locate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(report): Json<LocateReport>,
) -> Result<Json<RideRequestView>, AppError> {
    let reported = report.into_reported()?;
    Ok(Json(orchestrator::locate_pickup(&state, id, &reported).await?))
}

async fn select_point(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(point): Json<GeoPoint>,
) -> Result<Json<RideRequestView>, AppError> {
    Ok(Json(orchestrator::select_point(&state, id, point).await?))
}

async fn set_pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(point): Json<GeoPoint>,
) -> Result<Json<RideRequestView>, AppError> {
    Ok(Json(
        orchestrator::set_endpoint(&state, id, Endpoint::Pickup, point).await?,
    ))
}

async fn set_dropoff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(point): Json<GeoPoint>,
) -> Result<Json<RideRequestView>, AppError> {
    Ok(Json(
        orchestrator::set_endpoint(&state, id, Endpoint::Dropoff, point).await?,
    ))
}

async fn suggestions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<SuggestionsView>, AppError> {
    Ok(Json(
        orchestrator::search_suggestions(&state, id, params.field, params.q).await?,
    ))
}

async fn choose_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(choice): Json<SuggestionChoice>,
) -> Result<Json<RideRequestView>, AppError> {
    Ok(Json(
        orchestrator::choose_suggestion(&state, id, choice.field, choice.suggestion_id).await?,
    ))
}

async fn set_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(selection): Json<VehicleSelection>,
) -> Result<Json<RideRequestView>, AppError> {
    Ok(Json(orchestrator::set_vehicle(&state, id, &selection.vehicle)?))
}

async fn set_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(selection): Json<PaymentSelection>,
) -> Result<Json<RideRequestView>, AppError> {
    Ok(Json(orchestrator::set_payment(&state, id, &selection.payment)?))
}

async fn dismiss_notice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequestView>, AppError> {
    Ok(Json(orchestrator::dismiss_notice(&state, id)?))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmittedRide>, AppError> {
    Ok(Json(orchestrator::submit(&state, id).await?))
}

async fn list_rides(State(state): State<Arc<AppState>>) -> Json<Vec<SubmittedRide>> {
    let rides = state
        .rides
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(rides)
}

async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmittedRide>, AppError> {
    let ride = state
        .rides
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("ride {} not found", id)))?;

    Ok(Json(ride.value().clone()))
}
