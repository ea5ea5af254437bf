//! Async flows over ride-request sessions.
//!
//! Sessions live in a concurrent map. No map guard is held across an
//! `.await`: each flow captures a ticket, releases the session, awaits the
//! remote call and re-enters the session to apply the result only if the
//! ticket is still current.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::time::{interval, sleep, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::dispatch::enqueue_ride;
use crate::engine::locator::{CURRENT_LOCATION_LABEL, DeviceLocator, LocateError};
use crate::engine::ride_request::{
    Endpoint, RideRequest, RideRequestView, RouteOutcome, RouteTicket,
};
use crate::error::AppError;
use crate::geocoding::is_searchable;
use crate::models::place::{GeoPoint, PlaceSuggestion};
use crate::models::ride::{RideStatus, SubmittedRide};
use crate::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsView {
    pub field: Endpoint,
    pub query: String,
    pub applied: bool,
    pub suggestions: Vec<PlaceSuggestion>,
}

fn with_session<R>(
    state: &AppState,
    session_id: Uuid,
    f: impl FnOnce(&mut RideRequest) -> R,
) -> Result<R, AppError> {
    let mut session = state
        .sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("ride session {session_id} not found")))?;

    Ok(f(&mut session))
}

pub fn view(state: &AppState, session_id: Uuid) -> Result<RideRequestView, AppError> {
    with_session(state, session_id, |session| session.view())
}

pub async fn create_session(
    state: &AppState,
    locator: Option<&dyn DeviceLocator>,
) -> Result<RideRequestView, AppError> {
    let session = RideRequest::new(Uuid::new_v4());
    let session_id = session.id();
    state.sessions.insert(session_id, session);
    info!(%session_id, "ride session created");

    match locator {
        Some(locator) => locate_pickup(state, session_id, locator).await,
        None => view(state, session_id),
    }
}

pub fn discard_session(state: &AppState, session_id: Uuid) -> Result<(), AppError> {
    state
        .sessions
        .remove(&session_id)
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("ride session {session_id} not found")))
}

/// Runs the device locator under the configured timeout and, on success,
/// sets the pickup. Failures only leave a notice on the session.
pub async fn locate_pickup(
    state: &AppState,
    session_id: Uuid,
    locator: &dyn DeviceLocator,
) -> Result<RideRequestView, AppError> {
    // Fail fast on unknown sessions before waiting on the device.
    view(state, session_id)?;

    let position = match timeout(state.timings.geolocation_timeout, locator.current_position()).await
    {
        Ok(Ok(point)) => point.validated().map_err(|_| LocateError::Unavailable),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(LocateError::Timeout),
    };

    let point = match position {
        Ok(point) => point,
        Err(err) => {
            warn!(%session_id, error = %err, "device location failed; manual entry required");
            return with_session(state, session_id, |session| {
                session.set_notice(err.notice());
                session.view()
            });
        }
    };

    let label = state
        .geocoding
        .reverse_lookup(&point)
        .await
        .unwrap_or_else(|| CURRENT_LOCATION_LABEL.to_string());

    place_endpoint(state, session_id, Endpoint::Pickup, point.with_label(label)).await
}

/// Map-click style selection: the session decides which endpoint the point
/// replaces.
pub async fn select_point(
    state: &AppState,
    session_id: Uuid,
    point: GeoPoint,
) -> Result<RideRequestView, AppError> {
    let point = point.validated()?;
    view(state, session_id)?;

    let label = state.geocoding.reverse_lookup(&point).await;

    let ticket = with_session(state, session_id, |session| {
        let endpoint = session.target_for(&point);
        let label = label.unwrap_or_else(|| endpoint.default_label().to_string());
        debug!(%session_id, ?endpoint, "placing selected point");
        session.set_endpoint(endpoint, point.with_label(label))
    })?;

    settle_route(state, session_id, ticket).await
}

/// Autocomplete style selection into a specific field. Points arriving
/// without a label are reverse-geocoded.
pub async fn set_endpoint(
    state: &AppState,
    session_id: Uuid,
    endpoint: Endpoint,
    point: GeoPoint,
) -> Result<RideRequestView, AppError> {
    let point = point.validated()?;
    view(state, session_id)?;

    let point = match point.label {
        Some(_) => point,
        None => {
            let label = state
                .geocoding
                .reverse_lookup(&point)
                .await
                .unwrap_or_else(|| endpoint.default_label().to_string());
            point.with_label(label)
        }
    };

    place_endpoint(state, session_id, endpoint, point).await
}

async fn place_endpoint(
    state: &AppState,
    session_id: Uuid,
    endpoint: Endpoint,
    point: GeoPoint,
) -> Result<RideRequestView, AppError> {
    let ticket = with_session(state, session_id, |session| {
        session.set_endpoint(endpoint, point)
    })?;

    settle_route(state, session_id, ticket).await
}

async fn settle_route(
    state: &AppState,
    session_id: Uuid,
    ticket: Option<RouteTicket>,
) -> Result<RideRequestView, AppError> {
    if let Some(ticket) = ticket {
        let route = state.routing.route(&ticket.pickup, &ticket.dropoff).await;

        let outcome = with_session(state, session_id, |session| {
            session.apply_route(&ticket, route)
        })?;

        match outcome {
            RouteOutcome::Applied => {
                debug!(%session_id, generation = ticket.generation, "route applied");
            }
            RouteOutcome::Stale => {
                state
                    .metrics
                    .stale_results_discarded_total
                    .with_label_values(&["route"])
                    .inc();
                debug!(%session_id, generation = ticket.generation, "discarded stale route");
            }
            RouteOutcome::Unusable => {
                warn!(%session_id, "route and fallback both unusable");
            }
        }
    }

    view(state, session_id)
}

/// Debounced, most-recent-wins place search for one field of a session.
pub async fn search_suggestions(
    state: &AppState,
    session_id: Uuid,
    field: Endpoint,
    query: String,
) -> Result<SuggestionsView, AppError> {
    let ticket = with_session(state, session_id, |session| {
        session.suggestions_mut(field).issue(query.clone())
    })?;

    if !is_searchable(&query) {
        return with_session(state, session_id, |session| {
            let feed = session.suggestions_mut(field);
            let applied = feed.apply(&ticket, Vec::new());
            suggestions_view(session, field, applied)
        });
    }

    sleep(state.timings.search_debounce).await;

    let superseded = with_session(state, session_id, |session| {
        !session.suggestions(field).is_current(&ticket)
    })?;
    if superseded {
        state
            .metrics
            .stale_results_discarded_total
            .with_label_values(&["search_debounced"])
            .inc();
        return with_session(state, session_id, |session| {
            suggestions_view(session, field, false)
        });
    }

    let results = state.geocoding.search(&ticket.query).await;

    with_session(state, session_id, |session| {
        let applied = session.suggestions_mut(field).apply(&ticket, results);
        if !applied {
            state
                .metrics
                .stale_results_discarded_total
                .with_label_values(&["search"])
                .inc();
        }
        suggestions_view(session, field, applied)
    })
}

fn suggestions_view(session: &RideRequest, field: Endpoint, applied: bool) -> SuggestionsView {
    let feed = session.suggestions(field);
    SuggestionsView {
        field,
        query: feed.query().to_string(),
        applied,
        suggestions: feed.suggestions().to_vec(),
    }
}

/// Picks one of the suggestions currently offered for `field`.
pub async fn choose_suggestion(
    state: &AppState,
    session_id: Uuid,
    field: Endpoint,
    suggestion_id: u64,
) -> Result<RideRequestView, AppError> {
    let suggestion = with_session(state, session_id, |session| {
        session
            .suggestions(field)
            .suggestions()
            .iter()
            .find(|suggestion| suggestion.id == suggestion_id)
            .cloned()
    })?
    .ok_or_else(|| {
        AppError::NotFound(format!("suggestion {suggestion_id} is not offered for {field:?}"))
    })?;

    place_endpoint(state, session_id, field, GeoPoint::from(suggestion)).await
}

pub fn set_vehicle(state: &AppState, session_id: Uuid, key: &str) -> Result<RideRequestView, AppError> {
    let view = with_session(state, session_id, |session| {
        session.set_vehicle(key).map(|_| session.view())
    })??;

    if view.estimate.is_some() {
        state
            .metrics
            .fare_estimates_total
            .with_label_values(&["ride_request"])
            .inc();
    }
    Ok(view)
}

pub fn set_payment(state: &AppState, session_id: Uuid, key: &str) -> Result<RideRequestView, AppError> {
    with_session(state, session_id, |session| {
        session.set_payment(key).map(|_| session.view())
    })?
}

pub fn dismiss_notice(state: &AppState, session_id: Uuid) -> Result<RideRequestView, AppError> {
    with_session(state, session_id, |session| {
        session.dismiss_notice();
        session.view()
    })
}

/// Hands a complete request to dispatch. Incomplete or already submitted
/// requests are refused; a failed hand-off leaves the session submittable.
pub async fn submit(state: &AppState, session_id: Uuid) -> Result<SubmittedRide, AppError> {
    let ride_id = Uuid::new_v4();
    let payload = with_session(state, session_id, |session| session.claim_submission(ride_id))??;

    let ride = SubmittedRide {
        id: ride_id,
        session_id,
        payload,
        status: RideStatus::Pending,
        submitted_at: Utc::now(),
    };

    // Stored first so the dispatch worker always finds it.
    state.rides.insert(ride.id, ride.clone());

    if let Err(err) = enqueue_ride(state, ride.clone()).await {
        state.rides.remove(&ride.id);
        if let Some(mut session) = state.sessions.get_mut(&session_id) {
            session.release_submission(ride.id);
        }
        warn!(ride_id = %ride.id, %session_id, error = %err, "ride hand-off failed");
        return Err(err);
    }

    info!(ride_id = %ride.id, %session_id, "ride request submitted");
    Ok(ride)
}

/// Drops sessions untouched for longer than `idle_ttl`. Returns how many
/// were removed.
pub fn expire_idle_sessions(state: &AppState, now: DateTime<Utc>, idle_ttl: TimeDelta) -> usize {
    let before = state.sessions.len();
    state
        .sessions
        .retain(|_, session| now - session.updated_at() <= idle_ttl);
    before.saturating_sub(state.sessions.len())
}

pub async fn run_session_sweeper(state: Arc<AppState>, idle_ttl: Duration) {
    let Ok(ttl) = TimeDelta::from_std(idle_ttl) else {
        warn!(?idle_ttl, "session idle ttl out of range; sweeper disabled");
        return;
    };

    let mut ticker = interval(SWEEP_INTERVAL.min(idle_ttl));
    info!(idle_ttl_secs = idle_ttl.as_secs(), "session sweeper started");

    loop {
        ticker.tick().await;
        let expired = expire_idle_sessions(&state, Utc::now(), ttl);
        if expired > 0 {
            info!(expired, remaining = state.sessions.len(), "expired idle ride sessions");
        }
    }
}
